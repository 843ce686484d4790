use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Booking, BookingStats, BookingStatus, Payment},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub(crate) fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub bookings: BookingStats,
    pub total_payments: i64,
    pub payment_gateway: bool,
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Booking>>> {
    let bookings = state
        .service_context
        .booking_service
        .list(params.limit, params.offset)
        .await?;

    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(state.service_context.booking_service.get(id).await?))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .update_status(id, request.status)
        .await?;

    Ok(Json(booking))
}

pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(state.service_context.booking_service.confirm(id).await?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Payment>>> {
    let payments = state
        .service_context
        .payment_repo
        .list(params.limit, params.offset)
        .await?;

    Ok(Json(payments))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let ctx = &state.service_context;

    Ok(Json(StatsResponse {
        bookings: ctx.booking_service.stats().await?,
        total_payments: ctx.payment_repo.count().await?,
        payment_gateway: ctx.gateway.is_some(),
    }))
}

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Booking, CreateBookingRequest},
    error::Result,
    service::{BookingCheckout, BookingService, QuoteRequest, QuoteResponse},
};

pub async fn quote(Json(request): Json<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    Ok(Json(BookingService::quote(&request)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCheckout>)> {
    let today = Utc::now().date_naive();
    let checkout = state
        .service_context
        .booking_service
        .create_booking(&current.user, request, today)
        .await?;

    Ok((StatusCode::CREATED, Json(checkout)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Booking>>> {
    let bookings = state
        .service_context
        .booking_service
        .list_for_user(current.user.id)
        .await?;

    Ok(Json(bookings))
}

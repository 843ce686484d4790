use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{handlers::admin::ListParams, middleware::auth::CurrentUser, state::AppState},
    domain::{CreateRecipientRequest, InitiateTransferRequest, Transfer, TransferRecipient},
    error::Result,
    payments::Bank,
};

pub async fn list_banks(State(state): State<AppState>) -> Result<Json<Vec<Bank>>> {
    Ok(Json(state.service_context.payout_service.list_banks().await?))
}

pub async fn list_recipients(State(state): State<AppState>) -> Result<Json<Vec<TransferRecipient>>> {
    Ok(Json(state.service_context.payout_service.list_recipients().await?))
}

pub async fn create_recipient(
    State(state): State<AppState>,
    Json(request): Json<CreateRecipientRequest>,
) -> Result<(StatusCode, Json<TransferRecipient>)> {
    let recipient = state
        .service_context
        .payout_service
        .create_recipient(request)
        .await?;

    Ok((StatusCode::CREATED, Json(recipient)))
}

pub async fn list_transfers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transfer>>> {
    let transfers = state
        .service_context
        .payout_service
        .list_transfers(params.limit, params.offset)
        .await?;

    Ok(Json(transfers))
}

pub async fn initiate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<InitiateTransferRequest>,
) -> Result<(StatusCode, Json<Transfer>)> {
    let transfer = state
        .service_context
        .payout_service
        .initiate_transfer(current.user.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

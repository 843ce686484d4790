use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    payments::{is_valid_reference, verify_signature, WebhookEvent, SIGNATURE_HEADER},
    service::ReconcileOutcome,
};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentEventResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PaymentEventResponse {
    fn from_outcome(outcome: &ReconcileOutcome, reference: Option<String>) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message(),
            booking_id: outcome.booking_id(),
            reference,
        }
    }
}

pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PaymentEventResponse>> {
    let paystack = &state.settings.paystack;
    if paystack.verify_signatures {
        let Some(secret) = paystack.secret_key.as_deref() else {
            tracing::error!("Webhook received but no secret key is configured to verify it");
            return Err(AppError::Unauthorized);
        };

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !verify_signature(secret, &body, signature) {
            tracing::warn!("Rejected webhook with invalid signature");
            return Err(AppError::Unauthorized);
        }
    }

    let event = WebhookEvent::parse(&body)?;
    tracing::info!("Received webhook {}", event.name());

    let ctx = &state.service_context;
    match event {
        WebhookEvent::Charge { data, .. } => {
            let outcome = ctx.reconciliation_service.apply_charge(&data).await?;
            Ok(Json(PaymentEventResponse::from_outcome(&outcome, data.reference)))
        }
        WebhookEvent::Transfer { event, data } => {
            let updated = ctx.payout_service.apply_transfer_event(&event, &data).await?;
            let response = match updated {
                Some(transfer) => PaymentEventResponse {
                    success: true,
                    message: format!("Transfer status updated to {}", transfer.status.as_str()),
                    booking_id: None,
                    reference: Some(transfer.reference),
                },
                None => PaymentEventResponse {
                    success: false,
                    message: "Transfer not found".to_string(),
                    booking_id: None,
                    reference: data.reference,
                },
            };
            Ok(Json(response))
        }
    }
}

/// Client-driven confirmation after returning from the hosted checkout.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<PaymentEventResponse>> {
    let reference = request
        .reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("Transaction reference is required".to_string()))?;
    if !is_valid_reference(&reference) {
        return Err(AppError::BadRequest("Invalid transaction reference".to_string()));
    }

    let ctx = &state.service_context;
    let gateway = ctx.gateway.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Payment gateway is not configured".to_string())
    })?;

    let response = gateway.verify_transaction(&reference).await?;
    if !response.status {
        return Err(AppError::BadRequest(format!(
            "Payment verification failed: {}",
            response.message
        )));
    }

    let charge = response.data.ok_or_else(|| {
        AppError::Gateway("Verification returned no transaction".to_string())
    })?;

    if charge.reference.as_deref() != Some(reference.as_str()) {
        tracing::warn!(
            "Verification of {} returned transaction {:?}",
            reference,
            charge.reference
        );
        return Err(AppError::BadRequest(
            "Verified transaction does not match the requested reference".to_string(),
        ));
    }

    if !charge.is_success() {
        return Err(AppError::BadRequest(format!(
            "Payment not successful: {}",
            charge.status.as_deref().unwrap_or("unknown")
        )));
    }

    let outcome = ctx.reconciliation_service.apply_charge(&charge).await?;
    let mut body = PaymentEventResponse::from_outcome(&outcome, Some(reference));
    body.message = match &outcome {
        ReconcileOutcome::Confirmed { .. } => "Payment verified and booking confirmed".to_string(),
        ReconcileOutcome::Duplicate { .. } => "Payment already verified".to_string(),
        other => other.message(),
    };

    Ok(Json(body))
}

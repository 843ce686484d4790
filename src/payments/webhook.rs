use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::{
    error::{AppError, Result},
    payments::{ChargeData, TransferData},
};

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Check a delivery's signature: lowercase hex HMAC-SHA512 of the raw body,
/// keyed with the account's secret key.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    let provided = signature.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    event: String,
    data: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum WebhookEvent {
    Charge { event: String, data: ChargeData },
    Transfer { event: String, data: TransferData },
}

impl WebhookEvent {
    /// Decode a delivery body. Anything that is not a `transfer.*` event is
    /// treated as a charge notification.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {}", e)))?;

        let data = envelope
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| AppError::BadRequest("No data in webhook payload".to_string()))?;

        let invalid = |e: serde_json::Error| AppError::BadRequest(format!("Invalid webhook data: {}", e));

        if envelope.event.starts_with("transfer.") {
            Ok(WebhookEvent::Transfer {
                event: envelope.event,
                data: serde_json::from_value(data).map_err(invalid)?,
            })
        } else {
            Ok(WebhookEvent::Charge {
                event: envelope.event,
                data: serde_json::from_value(data).map_err(invalid)?,
            })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            WebhookEvent::Charge { event, .. } | WebhookEvent::Transfer { event, .. } => event,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A charge the gateway reported as settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub reference: String,
    /// Kobo, exactly as the gateway reported it.
    pub amount_minor: i64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub channel: Option<String>,
    pub status: String,
    pub gateway_response: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: Option<Uuid>,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub channel: Option<String>,
    pub status: String,
    pub gateway_response: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Whole units to kobo. `None` when the amount does not fit.
pub fn to_minor_units(amount: i64) -> Option<i64> {
    amount.checked_mul(100)
}

/// Kobo to whole units, when the amount has no fractional part.
pub fn from_minor_units(amount_minor: i64) -> Option<i64> {
    if amount_minor % 100 == 0 {
        Some(amount_minor / 100)
    } else {
        None
    }
}

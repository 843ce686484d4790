use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecipient {
    pub id: Uuid,
    pub recipient_code: String,
    pub name: String,
    pub email: String,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRecipient {
    pub recipient_code: String,
    pub name: String,
    pub email: String,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub recipient_name: String,
    pub recipient_email: String,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    /// Whole currency units.
    pub amount: i64,
    pub reference: String,
    pub recipient_code: String,
    pub transfer_code: Option<String>,
    pub status: TransferStatus,
    pub failure_reason: Option<String>,
    pub initiated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Otp,
    Processing,
    Success,
    Failed,
    Reversed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Otp => "otp",
            TransferStatus::Processing => "processing",
            TransferStatus::Success => "success",
            TransferStatus::Failed => "failed",
            TransferStatus::Reversed => "reversed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "otp" => Some(TransferStatus::Otp),
            "processing" => Some(TransferStatus::Processing),
            "success" => Some(TransferStatus::Success),
            "failed" => Some(TransferStatus::Failed),
            "reversed" => Some(TransferStatus::Reversed),
            _ => None,
        }
    }

    /// Map whatever the gateway reports onto the statuses we track.
    pub fn from_gateway(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!("Unrecognised transfer status from gateway: {}", s);
            TransferStatus::Processing
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub recipient: TransferRecipient,
    pub amount: i64,
    pub reference: String,
    pub initiated_by: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipientRequest {
    pub name: String,
    pub email: String,
    pub bank_code: String,
    pub account_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitiateTransferRequest {
    pub recipient_code: String,
    pub amount: i64,
    pub reason: Option<String>,
}

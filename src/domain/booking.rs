use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PriceTier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub package_id: String,
    pub package_name: String,
    /// Whole currency units (naira), never minor units.
    pub package_price: i64,
    pub price_tier: PriceTier,
    pub couples: bool,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub uploaded_images: Vec<UploadedImage>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created without an online checkout; the studio confirms it by hand.
    Pending,
    /// Waiting for the gateway to report a successful charge.
    PaymentPending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::PaymentPending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::PaymentPending => "payment_pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn awaits_confirmation(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::PaymentPending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub name: String,
    pub url: String,
}

/// Everything the repository needs to insert a booking row.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub package_id: String,
    pub package_name: String,
    pub package_price: i64,
    pub price_tier: PriceTier,
    pub couples: bool,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub uploaded_images: Vec<UploadedImage>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub package_id: String,
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<String>,
    #[serde(default)]
    pub couples: bool,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub special_requests: Option<String>,
    #[serde(default)]
    pub uploaded_images: Vec<UploadedImage>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingStats {
    pub total: i64,
    pub pending: i64,
    pub payment_pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

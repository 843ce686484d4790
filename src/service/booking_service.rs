use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    payments::PaymentGateway,
    repository::BookingRepository,
};

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub package_id: String,
    pub time: Option<String>,
    #[serde(default)]
    pub couples: bool,
    /// Tier the client already chose before picking a slot.
    #[serde(default)]
    pub tier: PriceTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    pub tier_change: Option<TierChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingCheckout {
    pub booking: Booking,
    /// Hosted checkout to send the client to; absent for manual payment.
    pub authorization_url: Option<String>,
}

pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        Self { repo, gateway }
    }

    pub fn quote(request: &QuoteRequest) -> Result<QuoteResponse> {
        let mut draft = BookingDraft::new(&request.package_id, request.couples)?
            .with_tier(request.tier);

        let tier_change = match request.time.as_deref() {
            Some(slot) => Some(draft.select_time(slot)?),
            None => None,
        };

        Ok(QuoteResponse {
            quote: draft.quote(),
            tier_change,
        })
    }

    pub async fn create_booking(
        &self,
        user: &User,
        request: CreateBookingRequest,
        today: NaiveDate,
    ) -> Result<BookingCheckout> {
        // The signed-in profile fills whatever the form left blank.
        let client_name =
            non_blank(request.client_name).or_else(|| non_blank(Some(user.full_name.clone())));
        let client_email =
            non_blank(request.client_email).or_else(|| non_blank(Some(user.email.clone())));
        let (Some(date), Some(time), Some(client_name), Some(client_email)) = (
            request.booking_date,
            request.booking_time,
            client_name,
            client_email,
        ) else {
            return Err(AppError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        };

        if !looks_like_email(&client_email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        let mut draft = BookingDraft::new(&request.package_id, request.couples)?;
        draft.select_date(date, today)?;
        draft.select_time(&time)?;
        let price = draft.checkout_price()?;
        let package = draft.package();

        let mut new_booking = NewBooking {
            user_id: user.id,
            client_name,
            client_email,
            package_id: package.id.to_string(),
            package_name: package.name.to_string(),
            package_price: price,
            price_tier: draft.tier(),
            couples: request.couples,
            booking_date: date,
            booking_time: time,
            status: BookingStatus::Pending,
            special_requests: non_blank(request.special_requests),
            uploaded_images: request.uploaded_images,
            payment_reference: None,
        };

        let Some(gateway) = &self.gateway else {
            let booking = self.repo.create(new_booking).await?;
            tracing::info!("Booking {} created for manual payment", booking.id);
            return Ok(BookingCheckout {
                booking,
                authorization_url: None,
            });
        };

        let amount_minor = to_minor_units(price)
            .ok_or_else(|| AppError::Validation("Amount is too large".to_string()))?;
        let reference = generate_payment_reference();
        let checkout = gateway
            .initialize_transaction(&new_booking.client_email, amount_minor, &reference)
            .await?;

        new_booking.status = BookingStatus::PaymentPending;
        new_booking.payment_reference = Some(reference);
        let booking = self.repo.create(new_booking).await?;

        tracing::info!(
            "Booking {} awaiting payment {} of {}",
            booking.id,
            checkout.reference,
            price
        );

        Ok(BookingCheckout {
            booking,
            authorization_url: Some(checkout.authorization_url),
        })
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.repo.list_by_user(user_id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Booking> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        self.repo.list(limit, offset).await
    }

    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let booking = self.repo.update_status(id, status).await?;
        tracing::info!("Booking {} set to {}", id, status.as_str());
        Ok(booking)
    }

    /// Admin confirmation of a booking still waiting on the studio or on payment.
    pub async fn confirm(&self, id: Uuid) -> Result<Booking> {
        let booking = self.get(id).await?;

        match booking.status {
            BookingStatus::Confirmed => Ok(booking),
            status if status.awaits_confirmation() => {
                self.update_status(id, BookingStatus::Confirmed).await
            }
            status => Err(AppError::Conflict(format!(
                "Booking is {} and cannot be confirmed",
                status.as_str()
            ))),
        }
    }

    pub async fn stats(&self) -> Result<BookingStats> {
        self.repo.stats().await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn generate_payment_reference() -> String {
    format!("bk_{}", Uuid::new_v4().simple())
}

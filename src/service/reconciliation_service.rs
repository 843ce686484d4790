use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    payments::ChargeData,
    repository::{BookingRepository, PaymentRepository},
};

/// Why a successful charge was stored without confirming a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    NoCandidate,
    Ambiguous,
    FractionalAmount,
    BookingChanged,
    AmountMismatch,
}

impl UnmatchedReason {
    pub fn describe(&self) -> &'static str {
        match self {
            UnmatchedReason::NoCandidate => "no booking awaiting this payment",
            UnmatchedReason::Ambiguous => "several bookings share this amount",
            UnmatchedReason::FractionalAmount => "amount is not a whole naira value",
            UnmatchedReason::BookingChanged => "booking is no longer awaiting payment",
            UnmatchedReason::AmountMismatch => "amount does not match the booking price",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Confirmed { booking_id: Uuid, payment: Payment },
    Unmatched { payment: Payment, reason: UnmatchedReason },
    Duplicate { reference: String },
    NotSuccessful { status: String },
}

impl ReconcileOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ReconcileOutcome::NotSuccessful { .. })
    }

    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            ReconcileOutcome::Confirmed { booking_id, .. } => Some(*booking_id),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ReconcileOutcome::Confirmed { .. } => {
                "Payment confirmed and booking updated".to_string()
            }
            ReconcileOutcome::Unmatched { reason, .. } => {
                format!("Payment recorded; {}", reason.describe())
            }
            ReconcileOutcome::Duplicate { .. } => "Payment already processed".to_string(),
            ReconcileOutcome::NotSuccessful { status } => {
                format!("Payment status is {}, no update performed", status)
            }
        }
    }
}

#[derive(Clone, Copy)]
enum BookingMatch {
    Found(Uuid),
    Missing(UnmatchedReason),
}

pub struct ReconciliationService {
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    default_currency: String,
}

impl ReconciliationService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        default_currency: String,
    ) -> Self {
        Self {
            booking_repo,
            payment_repo,
            default_currency,
        }
    }

    /// Apply a gateway charge to local state. Safe to call more than once for
    /// the same reference: only the first call records anything.
    pub async fn apply_charge(&self, charge: &ChargeData) -> Result<ReconcileOutcome> {
        if !charge.is_success() {
            let status = charge.status.clone().unwrap_or_else(|| "unknown".to_string());
            tracing::info!(
                "Ignoring charge {:?} with status {}",
                charge.reference,
                status
            );
            return Ok(ReconcileOutcome::NotSuccessful { status });
        }

        let reference = charge
            .reference
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("Payment reference is missing".to_string()))?;
        let amount_minor = charge
            .amount
            .ok_or_else(|| AppError::BadRequest("Payment amount is missing".to_string()))?;

        if self.payment_repo.find_by_reference(reference).await?.is_some() {
            tracing::info!("Payment {} already recorded", reference);
            return Ok(ReconcileOutcome::Duplicate {
                reference: reference.to_string(),
            });
        }

        let matched = self.match_booking(reference, amount_minor).await?;
        let booking_id = match matched {
            BookingMatch::Found(id) => Some(id),
            BookingMatch::Missing(_) => None,
        };

        let payment = self.new_payment(charge, reference, amount_minor, booking_id);
        let payment = match self.payment_repo.record(payment).await {
            Ok(payment) => payment,
            Err(AppError::Conflict(msg)) => {
                return self
                    .resolve_conflict(charge, reference, amount_minor, msg)
                    .await;
            }
            Err(e) => return Err(e),
        };

        Ok(match matched {
            BookingMatch::Found(booking_id) => {
                tracing::info!("Payment {} confirmed booking {}", reference, booking_id);
                ReconcileOutcome::Confirmed {
                    booking_id,
                    payment,
                }
            }
            BookingMatch::Missing(reason) => Self::unmatched(payment, reason),
        })
    }

    fn unmatched(payment: Payment, reason: UnmatchedReason) -> ReconcileOutcome {
        tracing::warn!(
            "Payment {} of {} recorded without a booking: {}",
            payment.reference,
            payment.amount_minor,
            reason.describe()
        );
        ReconcileOutcome::Unmatched { payment, reason }
    }

    /// A conflict means either a concurrent delivery of the same reference won
    /// the insert, or the matched booking left `payment_pending` meanwhile.
    async fn resolve_conflict(
        &self,
        charge: &ChargeData,
        reference: &str,
        amount_minor: i64,
        msg: String,
    ) -> Result<ReconcileOutcome> {
        if self.payment_repo.find_by_reference(reference).await?.is_some() {
            return Ok(ReconcileOutcome::Duplicate {
                reference: reference.to_string(),
            });
        }

        tracing::debug!("Retrying payment {} without a booking: {}", reference, msg);
        let payment = self
            .payment_repo
            .record(self.new_payment(charge, reference, amount_minor, None))
            .await?;
        Ok(Self::unmatched(payment, UnmatchedReason::BookingChanged))
    }

    async fn match_booking(&self, reference: &str, amount_minor: i64) -> Result<BookingMatch> {
        if let Some(booking) = self
            .booking_repo
            .find_awaiting_payment_by_reference(reference)
            .await?
        {
            if from_minor_units(amount_minor) != Some(booking.package_price) {
                tracing::warn!(
                    "Payment {} of {} does not cover booking {} priced at {}",
                    reference,
                    amount_minor,
                    booking.id,
                    booking.package_price
                );
                return Ok(BookingMatch::Missing(UnmatchedReason::AmountMismatch));
            }
            return Ok(BookingMatch::Found(booking.id));
        }

        // Bookings made before references were issued can only be matched by price.
        let Some(price) = from_minor_units(amount_minor) else {
            return Ok(BookingMatch::Missing(UnmatchedReason::FractionalAmount));
        };

        let candidates = self.booking_repo.find_awaiting_payment_by_price(price).await?;
        match candidates.as_slice() {
            [booking] => Ok(BookingMatch::Found(booking.id)),
            [] => Ok(BookingMatch::Missing(UnmatchedReason::NoCandidate)),
            many => {
                tracing::warn!(
                    "Payment {} of {} matches {} bookings; leaving all unconfirmed",
                    reference,
                    price,
                    many.len()
                );
                Ok(BookingMatch::Missing(UnmatchedReason::Ambiguous))
            }
        }
    }

    fn new_payment(
        &self,
        charge: &ChargeData,
        reference: &str,
        amount_minor: i64,
        booking_id: Option<Uuid>,
    ) -> NewPayment {
        NewPayment {
            booking_id,
            reference: reference.to_string(),
            amount_minor,
            currency: charge
                .currency
                .clone()
                .unwrap_or_else(|| self.default_currency.clone()),
            customer_email: charge.customer_email().map(str::to_string),
            channel: charge.channel.clone(),
            status: "success".to_string(),
            gateway_response: charge.gateway_response.clone(),
            paid_at: charge.paid_at,
        }
    }
}

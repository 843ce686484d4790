use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{BookingStatus, NewPayment, Payment},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    booking_id: Option<String>,
    reference: String,
    amount_minor: i64,
    currency: String,
    customer_email: Option<String>,
    channel: Option<String>,
    status: String,
    gateway_response: Option<String>,
    paid_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        let booking_id = row
            .booking_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id,
            reference: row.reference,
            amount_minor: row.amount_minor,
            currency: row.currency,
            customer_email: row.customer_email,
            channel: row.channel,
            status: row.status,
            gateway_response: row.gateway_response,
            paid_at: row.paid_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn record(&self, payment: NewPayment) -> Result<Payment> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        // The booking flip and the payment row land together or not at all.
        if let Some(booking_id) = payment.booking_id {
            let result = sqlx::query(
                "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?"
            )
            .bind(BookingStatus::Confirmed.as_str())
            .bind(now)
            .bind(booking_id.to_string())
            .bind(BookingStatus::PaymentPending.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                return Err(AppError::Conflict(
                    "Booking is no longer awaiting payment".to_string(),
                ));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, reference, amount_minor, currency, customer_email,
                channel, status, gateway_response, paid_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(payment.booking_id.map(|id| id.to_string()))
        .bind(&payment.reference)
        .bind(payment.amount_minor)
        .bind(&payment.currency)
        .bind(&payment.customer_email)
        .bind(&payment.channel)
        .bind(&payment.status)
        .bind(&payment.gateway_response)
        .bind(payment.paid_at.map(|dt| dt.naive_utc()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_reference(&payment.reference).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve recorded payment".to_string())
        })
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, reference, amount_minor, currency, customer_email,
                   channel, status, gateway_response, paid_at, created_at
            FROM payments
            WHERE reference = ?
            "#
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, reference, amount_minor, currency, customer_email,
                   channel, status, gateway_response, paid_at, created_at
            FROM payments
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

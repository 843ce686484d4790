use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStats, BookingStatus, NewBooking, PriceTier, UploadedImage},
    error::{AppError, Result},
    repository::BookingRepository,
};

const BOOKING_COLUMNS: &str = r#"
    id, user_id, client_name, client_email, package_id, package_name,
    package_price, price_tier, couples, booking_date, booking_time, status,
    special_requests, uploaded_images, payment_reference, created_at, updated_at
"#;

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct BookingRow {
    id: String,
    user_id: String,
    client_name: String,
    client_email: String,
    package_id: String,
    package_name: String,
    package_price: i64,
    price_tier: String,
    couples: i32,
    booking_date: NaiveDate,
    booking_time: String,
    status: String,
    special_requests: Option<String>,
    uploaded_images: String,
    payment_reference: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        let uploaded_images: Vec<UploadedImage> = serde_json::from_str(&row.uploaded_images)
            .map_err(|e| AppError::Database(format!("Invalid uploaded_images: {}", e)))?;

        Ok(Booking {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id).map_err(|e| AppError::Database(e.to_string()))?,
            client_name: row.client_name,
            client_email: row.client_email,
            package_id: row.package_id,
            package_name: row.package_name,
            package_price: row.package_price,
            price_tier: Self::parse_price_tier(&row.price_tier)?,
            couples: row.couples != 0,
            booking_date: row.booking_date,
            booking_time: row.booking_time,
            status: Self::parse_booking_status(&row.status)?,
            special_requests: row.special_requests,
            uploaded_images,
            payment_reference: row.payment_reference,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_booking_status(s: &str) -> Result<BookingStatus> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Database(format!("Invalid booking status: {}", s)))
    }

    fn parse_price_tier(s: &str) -> Result<PriceTier> {
        match s {
            "day" => Ok(PriceTier::Day),
            "night" => Ok(PriceTier::Night),
            _ => Err(AppError::Database(format!("Invalid price tier: {}", s))),
        }
    }

    async fn fetch_where(&self, clause: &str, bind: &str) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE {} ORDER BY created_at DESC",
            BOOKING_COLUMNS, clause
        );

        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        let id = Uuid::new_v4();
        let now_naive = Utc::now().naive_utc();
        let images_json = serde_json::to_string(&booking.uploaded_images)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, client_name, client_email, package_id, package_name,
                package_price, price_tier, couples, booking_date, booking_time, status,
                special_requests, uploaded_images, payment_reference, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(booking.user_id.to_string())
        .bind(&booking.client_name)
        .bind(&booking.client_email)
        .bind(&booking.package_id)
        .bind(&booking.package_name)
        .bind(booking.package_price)
        .bind(booking.price_tier.as_str())
        .bind(booking.couples as i32)
        .bind(booking.booking_date)
        .bind(&booking.booking_time)
        .bind(booking.status.as_str())
        .bind(&booking.special_requests)
        .bind(&images_json)
        .bind(&booking.payment_reference)
        .bind(now_naive)
        .bind(now_naive)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created booking".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC LIMIT ? OFFSET ?",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.fetch_where("user_id = ?", &user_id.to_string()).await
    }

    async fn find_awaiting_payment_by_reference(&self, reference: &str) -> Result<Option<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE payment_reference = ? AND status = ?",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(reference)
            .bind(BookingStatus::PaymentPending.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn find_awaiting_payment_by_price(&self, package_price: i64) -> Result<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE package_price = ? AND status = ? ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(package_price)
            .bind(BookingStatus::PaymentPending.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let result = sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated booking".to_string())
        })
    }

    async fn stats(&self) -> Result<BookingStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM bookings GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = BookingStats::default();
        for (status, count) in rows {
            match Self::parse_booking_status(&status)? {
                BookingStatus::Pending => stats.pending = count,
                BookingStatus::PaymentPending => stats.payment_pending = count,
                BookingStatus::Confirmed => stats.confirmed = count,
                BookingStatus::Completed => stats.completed = count,
                BookingStatus::Cancelled => stats.cancelled = count,
            }
            stats.total += count;
        }

        Ok(stats)
    }
}

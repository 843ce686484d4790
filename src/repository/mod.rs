use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod payment_repository;
pub mod transfer_repository;
pub mod user_repository;

pub use booking_repository::SqliteBookingRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use transfer_repository::SqliteTransferRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, email: &str, full_name: &str, password_hash: &str) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn roles(&self, user_id: Uuid) -> Result<Vec<Role>>;
    async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: NewBooking) -> Result<Booking>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Booking>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>>;
    async fn find_awaiting_payment_by_reference(&self, reference: &str) -> Result<Option<Booking>>;
    async fn find_awaiting_payment_by_price(&self, package_price: i64) -> Result<Vec<Booking>>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
    async fn stats(&self) -> Result<BookingStats>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment and, when it names a booking, confirm that booking in
    /// the same transaction. Fails with `Conflict` on a duplicate reference.
    async fn record(&self, payment: NewPayment) -> Result<Payment>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Payment>>;
    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait TransferRepository: Send + Sync {
    async fn create_recipient(&self, recipient: NewRecipient) -> Result<TransferRecipient>;
    async fn find_recipient_by_code(&self, recipient_code: &str) -> Result<Option<TransferRecipient>>;
    async fn list_active_recipients(&self) -> Result<Vec<TransferRecipient>>;
    async fn create_transfer(&self, transfer: NewTransfer) -> Result<Transfer>;
    async fn update_transfer(
        &self,
        id: Uuid,
        status: TransferStatus,
        transfer_code: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<Transfer>;
    async fn find_transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>>;
    async fn list_transfers(&self, limit: i64, offset: i64) -> Result<Vec<Transfer>>;
}

pub mod booking_service;
pub mod payout_service;
pub mod reconciliation_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::payments::PaymentGateway;
use crate::repository::*;
use crate::storage::UploadStore;

pub use booking_service::{BookingCheckout, BookingService, QuoteRequest, QuoteResponse};
pub use payout_service::PayoutService;
pub use reconciliation_service::{ReconcileOutcome, ReconciliationService, UnmatchedReason};

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub transfer_repo: Arc<dyn TransferRepository>,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub reconciliation_service: Arc<ReconciliationService>,
    pub payout_service: Arc<PayoutService>,
    pub upload_store: Arc<UploadStore>,
    /// `None` when no gateway key is configured; bookings then wait for manual payment.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        gateway: Option<Arc<dyn PaymentGateway>>,
        settings: &Settings,
    ) -> Self {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let transfer_repo: Arc<dyn TransferRepository> =
            Arc::new(SqliteTransferRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            settings.auth.session_duration_hours,
            settings.auth.secure_cookies,
        ));

        let currency = settings.paystack.currency.clone();
        let booking_service = Arc::new(BookingService::new(booking_repo.clone(), gateway.clone()));
        let reconciliation_service = Arc::new(ReconciliationService::new(
            booking_repo.clone(),
            payment_repo.clone(),
            currency.clone(),
        ));
        let payout_service = Arc::new(PayoutService::new(
            transfer_repo.clone(),
            gateway.clone(),
            currency,
        ));

        let upload_store = Arc::new(UploadStore::new(
            &settings.storage.uploads_dir,
            settings.storage.max_file_size_mb,
        ));

        Self {
            user_repo,
            booking_repo,
            payment_repo,
            transfer_repo,
            auth_service,
            booking_service,
            reconciliation_service,
            payout_service,
            upload_store,
            gateway,
            db_pool,
        }
    }
}

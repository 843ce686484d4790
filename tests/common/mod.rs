#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use studiobook::{
    domain::*,
    error::{AppError, Result},
    payments::*,
    repository::{BookingRepository, SqliteBookingRepository, SqliteUserRepository, UserRepository},
};

/// Fresh in-memory database with the schema applied. A single connection
/// keeps every query on the same in-memory instance.
pub async fn setup_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub async fn create_user(pool: &SqlitePool, email: &str) -> anyhow::Result<User> {
    let repo = SqliteUserRepository::new(pool.clone());
    let user = repo.create(email, "Test Client", "not-a-real-hash").await?;
    repo.grant_role(user.id, Role::User).await?;
    Ok(user)
}

pub fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

pub fn new_booking(user: &User, price: i64, status: BookingStatus, reference: Option<&str>) -> NewBooking {
    NewBooking {
        user_id: user.id,
        client_name: "Ada Obi".to_string(),
        client_email: "ada@example.com".to_string(),
        package_id: "standard".to_string(),
        package_name: "LIFESTYLE SESSION - CAMERA".to_string(),
        package_price: price,
        price_tier: PriceTier::Day,
        couples: false,
        booking_date: tomorrow(),
        booking_time: "2:00 PM".to_string(),
        status,
        special_requests: None,
        uploaded_images: Vec::new(),
        payment_reference: reference.map(str::to_string),
    }
}

pub async fn insert_booking(
    pool: &SqlitePool,
    user: &User,
    price: i64,
    status: BookingStatus,
    reference: Option<&str>,
) -> anyhow::Result<Booking> {
    let repo = SqliteBookingRepository::new(pool.clone());
    Ok(repo.create(new_booking(user, price, status, reference)).await?)
}

pub fn success_charge(reference: &str, amount_minor: i64) -> ChargeData {
    ChargeData {
        id: Some(1001),
        status: Some("success".to_string()),
        reference: Some(reference.to_string()),
        amount: Some(amount_minor),
        currency: Some("NGN".to_string()),
        customer: Some(Customer {
            email: Some("ada@example.com".to_string()),
        }),
        paid_at: Some(Utc::now()),
        channel: Some("card".to_string()),
        gateway_response: Some("Approved".to_string()),
    }
}

/// In-process stand-in for the payment gateway. Responses are scripted per
/// test and every call is recorded.
#[derive(Default)]
pub struct FakeGateway {
    pub initialized: Mutex<Vec<(String, i64, String)>>,
    pub transfers: Mutex<Vec<InitiateTransferParams>>,
    pub recipients: Mutex<Vec<CreateRecipientParams>>,
    pub verify_response: Mutex<Option<GatewayResponse<ChargeData>>>,
    pub transfer_response: Mutex<Option<GatewayResponse<TransferData>>>,
    pub fail_transfers: bool,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_transfers() -> Arc<Self> {
        Arc::new(Self {
            fail_transfers: true,
            ..Self::default()
        })
    }

    pub fn set_verify_response(&self, response: GatewayResponse<ChargeData>) {
        *self.verify_response.lock().unwrap() = Some(response);
    }

    pub fn set_transfer_response(&self, response: GatewayResponse<TransferData>) {
        *self.transfer_response.lock().unwrap() = Some(response);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<CheckoutSession> {
        self.initialized
            .lock()
            .unwrap()
            .push((email.to_string(), amount_minor, reference.to_string()));

        Ok(CheckoutSession {
            authorization_url: format!("https://checkout.test/{}", reference),
            access_code: "access_test".to_string(),
            reference: reference.to_string(),
        })
    }

    async fn verify_transaction(&self, _reference: &str) -> Result<GatewayResponse<ChargeData>> {
        self.verify_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Gateway("no verify response scripted".to_string()))
    }

    async fn list_banks(&self) -> Result<Vec<Bank>> {
        Ok(vec![
            Bank {
                name: "Access Bank".to_string(),
                code: "044".to_string(),
            },
            Bank {
                name: "Guaranty Trust Bank".to_string(),
                code: "058".to_string(),
            },
        ])
    }

    async fn create_recipient(
        &self,
        params: &CreateRecipientParams,
    ) -> Result<GatewayResponse<RecipientData>> {
        self.recipients.lock().unwrap().push(params.clone());

        Ok(GatewayResponse {
            status: true,
            message: "Transfer recipient created successfully".to_string(),
            data: Some(RecipientData {
                recipient_code: format!("RCP_{}", params.account_number),
                details: Some(RecipientDetails {
                    account_name: Some(params.name.to_uppercase()),
                    bank_name: None,
                }),
            }),
        })
    }

    async fn initiate_transfer(
        &self,
        params: &InitiateTransferParams,
    ) -> Result<GatewayResponse<TransferData>> {
        self.transfers.lock().unwrap().push(params.clone());

        if self.fail_transfers {
            return Ok(GatewayResponse {
                status: false,
                message: "Your balance is not enough to fulfil this request".to_string(),
                data: None,
            });
        }

        if let Some(response) = self.transfer_response.lock().unwrap().clone() {
            return Ok(response);
        }

        Ok(GatewayResponse {
            status: true,
            message: "Transfer has been queued".to_string(),
            data: Some(TransferData {
                transfer_code: Some("TRF_test".to_string()),
                reference: Some(params.reference.clone()),
                status: Some("pending".to_string()),
                reason: Some(params.reason.clone()),
                gateway_response: None,
            }),
        })
    }
}

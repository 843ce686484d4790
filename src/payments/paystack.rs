use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::PaystackConfig,
    error::{AppError, Result},
};

/// Every Paystack endpoint wraps its payload in this envelope. `status` is
/// false when the request was understood but refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> GatewayResponse<T> {
    /// The payload of an accepted request, or the gateway's refusal as `BadRequest`.
    pub fn into_data(self) -> Result<T> {
        if !self.status {
            return Err(AppError::BadRequest(self.message));
        }
        self.data
            .ok_or_else(|| AppError::Gateway(format!("Gateway returned no data: {}", self.message)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    pub email: Option<String>,
}

/// A charge as reported by verify-by-reference or a `charge.*` webhook.
/// Webhook payloads are not trusted to be complete, so everything is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargeData {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub reference: Option<String>,
    /// Kobo.
    pub amount: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    pub paid_at: Option<DateTime<Utc>>,
    pub channel: Option<String>,
    pub gateway_response: Option<String>,
}

impl ChargeData {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer.as_ref().and_then(|c| c.email.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub account_name: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientData {
    pub recipient_code: String,
    #[serde(default)]
    pub details: Option<RecipientDetails>,
}

/// A payout as reported by initiate-transfer or a `transfer.*` webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferData {
    pub transfer_code: Option<String>,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub gateway_response: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRecipientParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiateTransferParams {
    pub source: String,
    /// Kobo.
    pub amount: i64,
    pub recipient: String,
    pub reason: String,
    pub reference: String,
}

#[derive(Debug, Serialize)]
struct InitializeTransactionParams<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

/// Transaction references end up in a URL path, so only plain token
/// characters are accepted and at least one must be alphanumeric.
pub fn is_valid_reference(reference: &str) -> bool {
    reference.len() <= 100
        && reference.chars().any(|c| c.is_ascii_alphanumeric())
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '='))
}

/// The slice of the payment gateway this service talks to.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<CheckoutSession>;
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayResponse<ChargeData>>;
    async fn list_banks(&self) -> Result<Vec<Bank>>;
    async fn create_recipient(
        &self,
        params: &CreateRecipientParams,
    ) -> Result<GatewayResponse<RecipientData>>;
    async fn initiate_transfer(
        &self,
        params: &InitiateTransferParams,
    ) -> Result<GatewayResponse<TransferData>>;
}

pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
    currency: String,
    callback_url: Option<String>,
}

impl PaystackClient {
    pub fn new(secret_key: String, config: &PaystackConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key,
            currency: config.currency.clone(),
            callback_url: config.callback_url.clone(),
        }
    }

    /// Base URL plus path segments, each percent-encoded as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid gateway base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Gateway base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<GatewayResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = url.path().to_string();
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.secret_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let http_status = response.status();

        // Refusals arrive as 4xx with the usual envelope, so parse before judging the status code.
        response.json::<GatewayResponse<T>>().await.map_err(|e| {
            AppError::Gateway(format!(
                "Unreadable response from {} ({}): {}",
                path, http_status, e
            ))
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<CheckoutSession> {
        let params = InitializeTransactionParams {
            email,
            amount: amount_minor,
            reference,
            currency: &self.currency,
            callback_url: self.callback_url.as_deref(),
        };

        let response: GatewayResponse<CheckoutSession> = self
            .send(Method::POST, self.endpoint(&["transaction", "initialize"])?, Some(&params))
            .await?;

        response
            .into_data()
            .map_err(|e| AppError::Gateway(format!("Could not start checkout: {}", e)))
    }

    async fn verify_transaction(&self, reference: &str) -> Result<GatewayResponse<ChargeData>> {
        if !is_valid_reference(reference) {
            return Err(AppError::BadRequest("Invalid transaction reference".to_string()));
        }
        let url = self.endpoint(&["transaction", "verify", reference])?;
        self.send::<(), _>(Method::GET, url, None).await
    }

    async fn list_banks(&self) -> Result<Vec<Bank>> {
        let mut url = self.endpoint(&["bank"])?;
        url.query_pairs_mut().append_pair("currency", &self.currency);
        let response: GatewayResponse<Vec<Bank>> = self.send::<(), _>(Method::GET, url, None).await?;

        if !response.status {
            return Err(AppError::Gateway(format!("Bank list unavailable: {}", response.message)));
        }
        Ok(response.data.unwrap_or_default())
    }

    async fn create_recipient(
        &self,
        params: &CreateRecipientParams,
    ) -> Result<GatewayResponse<RecipientData>> {
        self.send(Method::POST, self.endpoint(&["transferrecipient"])?, Some(params))
            .await
    }

    async fn initiate_transfer(
        &self,
        params: &InitiateTransferParams,
    ) -> Result<GatewayResponse<TransferData>> {
        self.send(Method::POST, self.endpoint(&["transfer"])?, Some(params))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_response_parses() {
        let body = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "id": 4099260516,
                "status": "success",
                "reference": "re4lyvq3s3",
                "amount": 3500000,
                "currency": "NGN",
                "paid_at": "2024-08-22T09:15:02.000Z",
                "channel": "card",
                "gateway_response": "Successful",
                "customer": { "id": 181873746, "email": "demo@test.com" },
                "authorization": { "bin": "408408" }
            }
        }"#;

        let response: GatewayResponse<ChargeData> = serde_json::from_str(body).unwrap();
        let data = response.into_data().unwrap();
        assert!(data.is_success());
        assert_eq!(data.amount, Some(3_500_000));
        assert_eq!(data.customer_email(), Some("demo@test.com"));
        assert!(data.paid_at.is_some());
    }

    #[test]
    fn test_refusal_becomes_bad_request() {
        let body = r#"{ "status": false, "message": "Transaction reference not found" }"#;
        let response: GatewayResponse<ChargeData> = serde_json::from_str(body).unwrap();
        match response.into_data() {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Transaction reference not found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    fn client(base_url: &str) -> PaystackClient {
        let config = PaystackConfig {
            base_url: base_url.to_string(),
            ..PaystackConfig::default()
        };
        PaystackClient::new("sk_test".to_string(), &config)
    }

    #[test]
    fn test_reference_shape() {
        assert!(is_valid_reference("bk_3f2a9c01"));
        assert!(is_valid_reference("T685312322670591"));
        assert!(is_valid_reference("re4lyvq3s3.v=2-a"));
        assert!(!is_valid_reference(""));
        assert!(!is_valid_reference(".."));
        assert!(!is_valid_reference("../../transfer/TRF_1"));
        assert!(!is_valid_reference("bk_1?x=1"));
        assert!(!is_valid_reference("bk%2F1"));
    }

    #[test]
    fn test_endpoint_keeps_each_segment() {
        let paystack = client("https://api.paystack.co/");
        let url = paystack.endpoint(&["transaction", "verify", "a/../b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.paystack.co/transaction/verify/a%2F..%2Fb");

        let nested = client("http://127.0.0.1:9000/mock");
        let url = nested.endpoint(&["bank"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/mock/bank");
    }

    #[tokio::test]
    async fn test_verify_rejects_path_like_reference() {
        let paystack = client("http://127.0.0.1:9");
        let result = paystack.verify_transaction("../../transfer/TRF_1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_recipient_params_use_type_field() {
        let params = CreateRecipientParams {
            kind: "nuban".to_string(),
            name: "Ada".to_string(),
            account_number: "0001234567".to_string(),
            bank_code: "058".to_string(),
            currency: "NGN".to_string(),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["type"], "nuban");
    }
}

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    payments::{Bank, CreateRecipientParams, InitiateTransferParams, PaymentGateway, TransferData},
    repository::TransferRepository,
};

const DEFAULT_TRANSFER_REASON: &str = "Transfer from admin panel";
const UNKNOWN_BANK: &str = "Unknown Bank";

pub struct PayoutService {
    repo: Arc<dyn TransferRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    currency: String,
}

impl PayoutService {
    pub fn new(
        repo: Arc<dyn TransferRepository>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        currency: String,
    ) -> Self {
        Self {
            repo,
            gateway,
            currency,
        }
    }

    fn gateway(&self) -> Result<&Arc<dyn PaymentGateway>> {
        self.gateway.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("Payment gateway is not configured".to_string())
        })
    }

    pub async fn list_banks(&self) -> Result<Vec<Bank>> {
        self.gateway()?.list_banks().await
    }

    pub async fn list_recipients(&self) -> Result<Vec<TransferRecipient>> {
        self.repo.list_active_recipients().await
    }

    pub async fn list_transfers(&self, limit: i64, offset: i64) -> Result<Vec<Transfer>> {
        self.repo.list_transfers(limit, offset).await
    }

    pub async fn create_recipient(&self, request: CreateRecipientRequest) -> Result<TransferRecipient> {
        let fields = [
            &request.name,
            &request.email,
            &request.bank_code,
            &request.account_number,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::Validation("Please fill in all fields.".to_string()));
        }

        let gateway = self.gateway()?;
        let params = CreateRecipientParams {
            kind: "nuban".to_string(),
            name: request.name.trim().to_string(),
            account_number: request.account_number.trim().to_string(),
            bank_code: request.bank_code.trim().to_string(),
            currency: self.currency.clone(),
        };

        let data = gateway.create_recipient(&params).await?.into_data()?;

        // The bank list is only needed for a display name.
        let bank_name = match gateway.list_banks().await {
            Ok(banks) => bank_name_for(&banks, &params.bank_code),
            Err(e) => {
                tracing::warn!("Could not load bank list for recipient name: {}", e);
                UNKNOWN_BANK.to_string()
            }
        };

        let recipient = self
            .repo
            .create_recipient(NewRecipient {
                recipient_code: data.recipient_code,
                name: params.name,
                email: request.email.trim().to_string(),
                bank_name,
                bank_code: params.bank_code,
                account_number: params.account_number,
                account_name: data.details.and_then(|d| d.account_name),
            })
            .await?;

        tracing::info!("Added transfer recipient {}", recipient.recipient_code);
        Ok(recipient)
    }

    /// Record a pending transfer, then ask the gateway to move the money.
    /// The local row is marked failed if the gateway refuses.
    pub async fn initiate_transfer(
        &self,
        initiated_by: Uuid,
        request: InitiateTransferRequest,
    ) -> Result<Transfer> {
        if request.recipient_code.trim().is_empty() {
            return Err(AppError::Validation("Recipient is required".to_string()));
        }
        if request.amount <= 0 {
            return Err(AppError::Validation("Amount must be greater than zero".to_string()));
        }
        let amount_minor = to_minor_units(request.amount)
            .ok_or_else(|| AppError::Validation("Amount is too large".to_string()))?;

        let gateway = self.gateway()?;
        let recipient = self
            .repo
            .find_recipient_by_code(&request.recipient_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        let reference = generate_transfer_reference();
        let transfer = self
            .repo
            .create_transfer(NewTransfer {
                recipient,
                amount: request.amount,
                reference: reference.clone(),
                initiated_by,
            })
            .await?;

        let params = InitiateTransferParams {
            source: "balance".to_string(),
            amount: amount_minor,
            recipient: transfer.recipient_code.clone(),
            reason: request
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TRANSFER_REASON.to_string()),
            reference,
        };

        let data = match gateway.initiate_transfer(&params).await {
            Ok(response) if response.status => response.data.unwrap_or_default(),
            Ok(response) => {
                self.mark_failed(transfer.id, &response.message).await?;
                return Err(AppError::BadRequest(response.message));
            }
            Err(e) => {
                self.mark_failed(transfer.id, &e.to_string()).await?;
                return Err(e);
            }
        };

        let status = TransferStatus::from_gateway(data.status.as_deref().unwrap_or("pending"));
        let transfer = self
            .repo
            .update_transfer(transfer.id, status, data.transfer_code, None)
            .await?;

        tracing::info!(
            "Transfer {} of {} to {} is {}",
            transfer.reference,
            transfer.amount,
            transfer.recipient_code,
            transfer.status.as_str()
        );
        Ok(transfer)
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        tracing::warn!("Transfer {} failed at gateway: {}", id, reason);
        self.repo
            .update_transfer(id, TransferStatus::Failed, None, Some(reason.to_string()))
            .await?;
        Ok(())
    }

    /// Apply a `transfer.*` webhook. Returns `None` when the reference is not ours.
    pub async fn apply_transfer_event(&self, event: &str, data: &TransferData) -> Result<Option<Transfer>> {
        let reference = data
            .reference
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("Transfer reference is missing".to_string()))?;

        let Some(transfer) = self.repo.find_transfer_by_reference(reference).await? else {
            tracing::warn!("Webhook {} for unknown transfer {}", event, reference);
            return Ok(None);
        };

        let status = match event {
            "transfer.success" => TransferStatus::Success,
            "transfer.failed" => TransferStatus::Failed,
            "transfer.reversed" => TransferStatus::Reversed,
            _ => TransferStatus::from_gateway(data.status.as_deref().unwrap_or("processing")),
        };

        let failure_reason = match status {
            TransferStatus::Failed | TransferStatus::Reversed => data
                .reason
                .clone()
                .or_else(|| data.gateway_response.clone()),
            _ => None,
        };

        let updated = self
            .repo
            .update_transfer(transfer.id, status, data.transfer_code.clone(), failure_reason)
            .await?;

        tracing::info!("Transfer {} is now {}", reference, status.as_str());
        Ok(Some(updated))
    }
}

fn bank_name_for(banks: &[Bank], code: &str) -> String {
    banks
        .iter()
        .find(|b| b.code == code)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| UNKNOWN_BANK.to_string())
}

/// `tx_<unix millis>_<9 base36 chars>`
fn generate_transfer_reference() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("tx_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_reference_format() {
        let reference = generate_transfer_reference();
        let parts: Vec<&str> = reference.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "tx");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_bank_name_lookup() {
        let banks = vec![
            Bank { name: "Access Bank".to_string(), code: "044".to_string() },
            Bank { name: "GTBank".to_string(), code: "058".to_string() },
        ];
        assert_eq!(bank_name_for(&banks, "058"), "GTBank");
        assert_eq!(bank_name_for(&banks, "999"), "Unknown Bank");
    }
}

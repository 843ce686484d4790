use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{NewRecipient, NewTransfer, Transfer, TransferRecipient, TransferStatus},
    error::{AppError, Result},
    repository::TransferRepository,
};

#[derive(FromRow)]
struct RecipientRow {
    id: String,
    recipient_code: String,
    name: String,
    email: String,
    bank_name: String,
    bank_code: String,
    account_number: String,
    account_name: Option<String>,
    is_active: i32,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct TransferRow {
    id: String,
    recipient_name: String,
    recipient_email: String,
    bank_name: String,
    bank_code: String,
    account_number: String,
    amount: i64,
    reference: String,
    recipient_code: String,
    transfer_code: Option<String>,
    status: String,
    failure_reason: Option<String>,
    initiated_by: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const RECIPIENT_COLUMNS: &str = r#"
    id, recipient_code, name, email, bank_name, bank_code, account_number,
    account_name, is_active, created_at
"#;

const TRANSFER_COLUMNS: &str = r#"
    id, recipient_name, recipient_email, bank_name, bank_code, account_number,
    amount, reference, recipient_code, transfer_code, status, failure_reason,
    initiated_by, created_at, updated_at
"#;

pub struct SqliteTransferRepository {
    pool: SqlitePool,
}

impl SqliteTransferRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_recipient(row: RecipientRow) -> Result<TransferRecipient> {
        Ok(TransferRecipient {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            recipient_code: row.recipient_code,
            name: row.name,
            email: row.email,
            bank_name: row.bank_name,
            bank_code: row.bank_code,
            account_number: row.account_number,
            account_name: row.account_name,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn row_to_transfer(row: TransferRow) -> Result<Transfer> {
        Ok(Transfer {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            recipient_name: row.recipient_name,
            recipient_email: row.recipient_email,
            bank_name: row.bank_name,
            bank_code: row.bank_code,
            account_number: row.account_number,
            amount: row.amount,
            reference: row.reference,
            recipient_code: row.recipient_code,
            transfer_code: row.transfer_code,
            status: TransferStatus::parse(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid transfer status: {}", row.status)))?,
            failure_reason: row.failure_reason,
            initiated_by: Uuid::parse_str(&row.initiated_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn find_transfer_by_id(&self, id: Uuid) -> Result<Option<Transfer>> {
        let sql = format!("SELECT {} FROM transfers WHERE id = ?", TRANSFER_COLUMNS);
        let row = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_transfer).transpose()
    }

    async fn reload(&self, id: Uuid) -> Result<Transfer> {
        self.find_transfer_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated transfer".to_string())
        })
    }
}

#[async_trait]
impl TransferRepository for SqliteTransferRepository {
    async fn create_recipient(&self, recipient: NewRecipient) -> Result<TransferRecipient> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO transfer_recipients (
                id, recipient_code, name, email, bank_name, bank_code,
                account_number, account_name, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&recipient.recipient_code)
        .bind(&recipient.name)
        .bind(&recipient.email)
        .bind(&recipient.bank_name)
        .bind(&recipient.bank_code)
        .bind(&recipient.account_number)
        .bind(&recipient.account_name)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_recipient_by_code(&recipient.recipient_code)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created recipient".to_string()))
    }

    async fn find_recipient_by_code(&self, recipient_code: &str) -> Result<Option<TransferRecipient>> {
        let sql = format!(
            "SELECT {} FROM transfer_recipients WHERE recipient_code = ?",
            RECIPIENT_COLUMNS
        );
        let row = sqlx::query_as::<_, RecipientRow>(&sql)
            .bind(recipient_code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_recipient).transpose()
    }

    async fn list_active_recipients(&self) -> Result<Vec<TransferRecipient>> {
        let sql = format!(
            "SELECT {} FROM transfer_recipients WHERE is_active = 1 ORDER BY name",
            RECIPIENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecipientRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_recipient).collect()
    }

    async fn create_transfer(&self, transfer: NewTransfer) -> Result<Transfer> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let recipient = &transfer.recipient;

        sqlx::query(
            r#"
            INSERT INTO transfers (
                id, recipient_name, recipient_email, bank_name, bank_code, account_number,
                amount, reference, recipient_code, status, initiated_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&recipient.name)
        .bind(&recipient.email)
        .bind(&recipient.bank_name)
        .bind(&recipient.bank_code)
        .bind(&recipient.account_number)
        .bind(transfer.amount)
        .bind(&transfer.reference)
        .bind(&recipient.recipient_code)
        .bind(TransferStatus::Pending.as_str())
        .bind(transfer.initiated_by.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.reload(id).await
    }

    async fn update_transfer(
        &self,
        id: Uuid,
        status: TransferStatus,
        transfer_code: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<Transfer> {
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = ?,
                transfer_code = COALESCE(?, transfer_code),
                failure_reason = COALESCE(?, failure_reason),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(status.as_str())
        .bind(&transfer_code)
        .bind(&failure_reason)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transfer not found".to_string()));
        }

        self.reload(id).await
    }

    async fn find_transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>> {
        let sql = format!("SELECT {} FROM transfers WHERE reference = ?", TRANSFER_COLUMNS);
        let row = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_transfer).transpose()
    }

    async fn list_transfers(&self, limit: i64, offset: i64) -> Result<Vec<Transfer>> {
        let sql = format!(
            "SELECT {} FROM transfers ORDER BY created_at DESC LIMIT ? OFFSET ?",
            TRANSFER_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_transfer).collect()
    }
}

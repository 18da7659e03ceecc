//! Ledger entities: players, FTDs, commissions, revenue-share reports and
//! transactions.

use chrono::{DateTime, Utc};
use domain::models::ledger::{Transaction, TransactionStatus, TransactionType, TransactionView};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for transaction_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionTypeDb {
    Cpa,
    RevenueShare,
}

impl From<TransactionTypeDb> for TransactionType {
    fn from(db: TransactionTypeDb) -> Self {
        match db {
            TransactionTypeDb::Cpa => TransactionType::Cpa,
            TransactionTypeDb::RevenueShare => TransactionType::RevenueShare,
        }
    }
}

impl From<TransactionType> for TransactionTypeDb {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Cpa => TransactionTypeDb::Cpa,
            TransactionType::RevenueShare => TransactionTypeDb::RevenueShare,
        }
    }
}

/// Database enum for transaction_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<TransactionStatusDb> for TransactionStatus {
    fn from(db: TransactionStatusDb) -> Self {
        match db {
            TransactionStatusDb::Pending => TransactionStatus::Pending,
            TransactionStatusDb::Approved => TransactionStatus::Approved,
            TransactionStatusDb::Rejected => TransactionStatus::Rejected,
        }
    }
}

impl From<TransactionStatus> for TransactionStatusDb {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => TransactionStatusDb::Pending,
            TransactionStatus::Approved => TransactionStatusDb::Approved,
            TransactionStatus::Rejected => TransactionStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the transactions table, joined with the
/// affiliate name.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionViewEntity {
    pub id: Uuid,
    pub affiliate_id: Uuid,
    pub player_id: Option<Uuid>,
    pub amount: Decimal,
    #[sqlx(rename = "type")]
    pub transaction_type: TransactionTypeDb,
    pub status: TransactionStatusDb,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub affiliate_name: String,
}

impl From<TransactionViewEntity> for TransactionView {
    fn from(entity: TransactionViewEntity) -> Self {
        Self {
            transaction: Transaction {
                id: entity.id,
                affiliate_id: entity.affiliate_id,
                player_id: entity.player_id,
                amount: entity.amount,
                transaction_type: entity.transaction_type.into(),
                status: entity.status.into(),
                date: entity.date,
                description: entity.description,
            },
            affiliate_name: entity.affiliate_name,
        }
    }
}

/// Partner-linked affiliate lookup row.
#[derive(Debug, Clone, FromRow)]
pub struct LinkedAffiliateEntity {
    pub id: Uuid,
    pub name: String,
    pub external_id: String,
}

impl From<LinkedAffiliateEntity> for domain::services::ledger::LinkedAffiliate {
    fn from(entity: LinkedAffiliateEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            external_id: entity.external_id,
        }
    }
}

use crate::domain::payment::{Amount, PaymentReference};
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const TOP_UP_DESCRIPTION: &str = "Mobile money top up";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    TransferIn,
    TransferOut,
    FarePayment,
}

/// Whether the provider actually confirmed the money moved.
///
/// `Pending` marks records finalized without a terminal provider answer; those
/// still need to be verified later.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationStatus {
    Success,
    Pending,
}

/// The finalized record handed to the caller. `amount` is never negative; the
/// direction of the money lives in `type`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub id: String,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub confirmation_status: ConfirmationStatus,
}

impl TransactionRecord {
    /// Builds the deposit record emitted at the end of a payment session.
    pub fn top_up(
        reference: &PaymentReference,
        amount: Amount,
        confirmation_status: ConfirmationStatus,
    ) -> Self {
        Self {
            id: format!("PH-{}", reference),
            r#type: TransactionType::Deposit,
            amount: amount.value(),
            timestamp: Utc::now(),
            description: TOP_UP_DESCRIPTION.to_string(),
            confirmation_status,
        }
    }
}

/// A history entry as the record-keeping backend returns it.
///
/// Transfers come back as a single `TRANSFER` kind with a signed amount.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RawTransaction {
    pub id: serde_json::Value,
    pub r#type: String,
    pub amount: Decimal,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<RawTransaction> for TransactionRecord {
    type Error = PaymentError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let r#type = match raw.r#type.to_ascii_uppercase().as_str() {
            "DEPOSIT" => TransactionType::Deposit,
            "TRANSFER" if raw.amount < Decimal::ZERO => TransactionType::TransferOut,
            "TRANSFER" | "TRANSFER_IN" => TransactionType::TransferIn,
            "TRANSFER_OUT" => TransactionType::TransferOut,
            "FARE_PAYMENT" => TransactionType::FarePayment,
            other => {
                return Err(PaymentError::ValidationError(format!(
                    "Unknown transaction type: {}",
                    other
                )));
            }
        };

        let id = match raw.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(Self {
            id,
            r#type,
            amount: raw.amount.abs(),
            timestamp: raw.created_at,
            description: raw.description.unwrap_or_default(),
            // Anything the backend already lists has settled.
            confirmation_status: ConfirmationStatus::Success,
        })
    }
}

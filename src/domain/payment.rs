use crate::domain::phone::PhoneNumber;
use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Represents a positive monetary amount for a payment request.
///
/// Wraps `rust_decimal::Decimal` so a zero or negative amount can never reach a gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Opaque correlation id between a submitted payment and its status checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds a fresh `{prefix}-{id}` reference that is unique for the process lifetime.
    pub fn synthesize(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status strings reported by the provider.
///
/// The provider vocabulary is open: anything that is not `SUCCESS` or `FAILED`
/// is kept verbatim and treated as still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderStatus {
    Queued,
    Pending,
    Success,
    Failed,
    Other(String),
}

impl ProviderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProviderStatus::Success | ProviderStatus::Failed)
    }
}

impl From<&str> for ProviderStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => ProviderStatus::Queued,
            "PENDING" => ProviderStatus::Pending,
            "SUCCESS" => ProviderStatus::Success,
            "FAILED" => ProviderStatus::Failed,
            _ => ProviderStatus::Other(value.to_string()),
        }
    }
}

impl From<String> for ProviderStatus {
    fn from(value: String) -> Self {
        ProviderStatus::from(value.as_str())
    }
}

impl From<ProviderStatus> for String {
    fn from(status: ProviderStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStatus::Queued => f.write_str("QUEUED"),
            ProviderStatus::Pending => f.write_str("PENDING"),
            ProviderStatus::Success => f.write_str("SUCCESS"),
            ProviderStatus::Failed => f.write_str("FAILED"),
            ProviderStatus::Other(raw) => f.write_str(raw),
        }
    }
}

/// A validated request, ready to be handed to a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub phone: PhoneNumber,
}

/// What the gateway hands back once a payment prompt has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitiationReceipt {
    pub reference: PaymentReference,
    pub provider_state: ProviderStatus,
    pub checkout_id: Option<String>,
}

/// A single status answer from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: ProviderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,
}

impl StatusReport {
    pub fn with_status(status: ProviderStatus) -> Self {
        Self {
            status,
            amount: None,
            phone_number: None,
            provider_reference: None,
        }
    }
}

use crate::domain::payment::PaymentReference;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid phone number: {0}")]
    InvalidPhoneFormat(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("{0}")]
    InitiationError(String),
    #[error("Payment declined: {0}")]
    Declined(String),
    #[error("Status check failed: {0}")]
    TransientQuery(String),
    #[error("A polling session is already running for {0}")]
    PollInProgress(PaymentReference),
    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: String, action: &'static str },
    #[error("Payment session was closed")]
    Closed,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl PaymentError {
    /// Errors raised by local validation, before anything reaches the network.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidPhoneFormat(_) | PaymentError::ValidationError(_)
        )
    }

    /// True when the error text reports an explicit decline by the provider.
    pub fn signals_decline(&self) -> bool {
        match self {
            PaymentError::Declined(_) => true,
            other => other.to_string().to_lowercase().contains("declined"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decline_detection_is_case_insensitive() {
        let err = PaymentError::TransientQuery("Transaction DECLINED by user".to_string());
        assert!(err.signals_decline());

        let err = PaymentError::TransientQuery("connection reset by peer".to_string());
        assert!(!err.signals_decline());
    }

    #[test]
    fn test_input_errors() {
        assert!(PaymentError::InvalidPhoneFormat("12".to_string()).is_input_error());
        assert!(PaymentError::ValidationError("Amount must be positive".to_string()).is_input_error());
        assert!(!PaymentError::InitiationError("timeout".to_string()).is_input_error());
    }
}

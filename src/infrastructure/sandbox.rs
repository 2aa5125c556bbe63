use crate::config::SandboxSettings;
use crate::domain::payment::{
    InitiationReceipt, PaymentReference, PaymentRequest, ProviderStatus, StatusReport,
};
use crate::domain::ports::PaymentGateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Instant, sleep};
use tracing::info;

#[derive(Debug, Clone)]
struct SandboxEntry {
    amount: Decimal,
    phone: String,
    created: Instant,
}

/// A local stand-in for the live gateway.
///
/// Every accepted prompt reports `QUEUED` until `confirm_after` has passed since
/// it was created, then `SUCCESS`. Time is read from `tokio::time`, so tests
/// running on a paused clock see fully deterministic transitions.
#[derive(Clone)]
pub struct SandboxGateway {
    settings: SandboxSettings,
    reference_prefix: String,
    payments: Arc<RwLock<HashMap<PaymentReference, SandboxEntry>>>,
}

impl SandboxGateway {
    pub fn new(settings: SandboxSettings, reference_prefix: impl Into<String>) -> Self {
        Self {
            settings,
            reference_prefix: reference_prefix.into(),
            payments: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn initiate(&self, request: &PaymentRequest) -> Result<InitiationReceipt> {
        let reference = PaymentReference::synthesize(&self.reference_prefix);
        info!(
            reference = %reference,
            amount = %request.amount,
            phone = %request.phone,
            "sandbox: simulating payment prompt"
        );

        sleep(self.settings.latency).await;

        let checkout_id = format!(
            "ws_CO_SANDBOX_{}",
            reference
                .as_str()
                .trim_start_matches(&self.reference_prefix)
                .trim_start_matches('-')
        );
        self.payments.write().await.insert(
            reference.clone(),
            SandboxEntry {
                amount: request.amount.value(),
                phone: request.phone.to_string(),
                created: Instant::now(),
            },
        );

        Ok(InitiationReceipt {
            reference,
            provider_state: ProviderStatus::Queued,
            checkout_id: Some(checkout_id),
        })
    }

    async fn check_status(&self, reference: &PaymentReference) -> Result<StatusReport> {
        let payments = self.payments.read().await;
        let entry = payments.get(reference).ok_or_else(|| {
            PaymentError::TransientQuery("Reference not found in sandbox".to_string())
        })?;

        if entry.created.elapsed() > self.settings.confirm_after {
            info!(reference = %reference, "sandbox: payment confirmed");
            return Ok(StatusReport {
                status: ProviderStatus::Success,
                amount: Some(entry.amount),
                phone_number: Some(entry.phone.clone()),
                provider_reference: Some(format!("SANDBOX_{}", reference)),
            });
        }

        Ok(StatusReport::with_status(ProviderStatus::Queued))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use crate::domain::phone::PhoneNumber;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount: Amount::new(dec!(100)).unwrap(),
            phone: PhoneNumber::parse("0712345678").unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sandbox_confirms_after_delay() {
        let gateway = SandboxGateway::new(SandboxSettings::default(), "MA3PAY");
        let receipt = gateway.initiate(&request()).await.unwrap();
        assert!(receipt.reference.as_str().starts_with("MA3PAY-"));
        assert_eq!(receipt.provider_state, ProviderStatus::Queued);
        assert!(receipt.checkout_id.unwrap().starts_with("ws_CO_SANDBOX_"));

        let early = gateway.check_status(&receipt.reference).await.unwrap();
        assert_eq!(early.status, ProviderStatus::Queued);

        tokio::time::advance(Duration::from_secs(6)).await;

        let late = gateway.check_status(&receipt.reference).await.unwrap();
        assert_eq!(late.status, ProviderStatus::Success);
        assert_eq!(late.amount, Some(dec!(100)));
        assert_eq!(late.phone_number.as_deref(), Some("254712345678"));
        assert_eq!(
            late.provider_reference,
            Some(format!("SANDBOX_{}", receipt.reference))
        );
    }

    #[tokio::test]
    async fn test_sandbox_unknown_reference() {
        let gateway = SandboxGateway::new(SandboxSettings::default(), "MA3PAY");
        let result = gateway
            .check_status(&PaymentReference::new("MA3PAY-missing"))
            .await;
        assert!(matches!(result, Err(PaymentError::TransientQuery(_))));
    }
}

use crate::domain::payment::{Amount, InitiationReceipt, PaymentRequest};
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{GatewayBox, RecordKeeperBox};
use crate::error::{PaymentError, Result};
use tracing::{error, info, warn};

/// Submits payment prompts to the gateway.
///
/// The phone number is validated and normalized locally first, so an invalid
/// number never costs a network call. Submission happens exactly once.
pub struct PaymentInitiator {
    gateway: GatewayBox,
    records: Option<RecordKeeperBox>,
}

impl PaymentInitiator {
    pub fn new(gateway: GatewayBox) -> Self {
        Self {
            gateway,
            records: None,
        }
    }

    /// Also notes every accepted payment as a pending deposit on `records`.
    pub fn with_record_keeper(mut self, records: RecordKeeperBox) -> Self {
        self.records = Some(records);
        self
    }

    pub async fn initiate(&self, amount: Amount, phone: &str) -> Result<InitiationReceipt> {
        let phone = PhoneNumber::parse(phone)?;
        let request = PaymentRequest { amount, phone };

        let receipt = self.gateway.initiate(&request).await.map_err(|e| {
            error!(amount = %request.amount, phone = %request.phone, "payment initiation failed: {}", e);
            match e {
                PaymentError::InitiationError(message) => PaymentError::InitiationError(message),
                other => PaymentError::InitiationError(other.to_string()),
            }
        })?;

        info!(
            reference = %receipt.reference,
            provider_state = %receipt.provider_state,
            "payment prompt accepted"
        );

        if let Some(records) = &self.records
            && let Err(e) = records.notify_pending_deposit(request.amount).await
        {
            warn!(reference = %receipt.reference, "pending deposit notification failed (ignored): {}", e);
        }

        Ok(receipt)
    }
}

use super::initiator::PaymentInitiator;
use super::poller::ConfirmationPoller;
use super::session::PaymentSession;
use crate::config::{Config, PollPolicy};
use crate::domain::payment::{Amount, PaymentReference, StatusReport};
use crate::domain::ports::{GatewayBox, RecordKeeperBox};
use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use crate::infrastructure::{build_gateway, build_record_keeper};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Wires a gateway and a record keeper into payment sessions.
///
/// Sessions opened from the same service share the gateway and the poller's
/// in-flight reference set, and nothing else.
pub struct PaymentService {
    gateway: GatewayBox,
    records: RecordKeeperBox,
    initiator: Arc<PaymentInitiator>,
    poller: ConfirmationPoller,
    success_delay: Duration,
}

impl PaymentService {
    pub fn new(
        gateway: GatewayBox,
        records: RecordKeeperBox,
        policy: PollPolicy,
        success_delay: Duration,
    ) -> Self {
        let initiator = Arc::new(
            PaymentInitiator::new(Arc::clone(&gateway)).with_record_keeper(Arc::clone(&records)),
        );
        let poller = ConfirmationPoller::new(Arc::clone(&gateway), policy);
        Self {
            gateway,
            records,
            initiator,
            poller,
            success_delay,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            build_gateway(config)?,
            build_record_keeper(config)?,
            config.poll,
            config.success_delay,
        ))
    }

    /// Opens a new payment surface for a fixed amount.
    pub fn session(&self, amount: Amount) -> PaymentSession {
        PaymentSession::new(
            amount,
            Arc::clone(&self.initiator),
            self.poller.clone(),
            self.success_delay,
        )
    }

    /// A single status query, outside of any polling session.
    pub async fn check_status(&self, reference: &PaymentReference) -> Result<StatusReport> {
        self.gateway.check_status(reference).await
    }

    /// Wallet history, mapped for display. Entries of an unknown kind are skipped.
    pub async fn activity(&self) -> Result<Vec<TransactionRecord>> {
        let raw = self.records.list_activity().await?;
        Ok(raw
            .into_iter()
            .filter_map(|tx| match TransactionRecord::try_from(tx) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping history entry: {}", e);
                    None
                }
            })
            .collect())
    }
}

use super::payment::{Amount, InitiationReceipt, PaymentReference, PaymentRequest, StatusReport};
use super::transaction::RawTransaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The mobile-money provider that pushes payment prompts and reports their status.
///
/// Implementations must not retry internally: a failed `initiate` or
/// `check_status` is reported once and the caller decides what happens next.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits one payment prompt and returns the reference to poll with.
    async fn initiate(&self, request: &PaymentRequest) -> Result<InitiationReceipt>;

    /// Asks once for the current status of `reference`.
    ///
    /// `Err` means the query itself failed; a provider-reported failure is an
    /// `Ok` report with status `FAILED`.
    async fn check_status(&self, reference: &PaymentReference) -> Result<StatusReport>;
}

/// Best-effort record keeping on the wallet backend.
#[async_trait]
pub trait RecordKeeper: Send + Sync {
    async fn notify_pending_deposit(&self, amount: Amount) -> Result<()>;
    async fn list_activity(&self) -> Result<Vec<RawTransaction>>;
}

pub type GatewayBox = Arc<dyn PaymentGateway>;
pub type RecordKeeperBox = Arc<dyn RecordKeeper>;

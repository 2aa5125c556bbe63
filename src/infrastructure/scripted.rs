use crate::domain::payment::{
    InitiationReceipt, PaymentReference, PaymentRequest, ProviderStatus, StatusReport,
};
use crate::domain::ports::PaymentGateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
enum Step {
    Status(ProviderStatus),
    Error(String),
}

/// Test double: a gateway that replays a fixed script of status answers.
///
/// Not selectable through configuration; tests construct it directly.
/// Each `check_status` call consumes the next scripted step; once the script
/// runs out every further call answers with the `otherwise` status (`QUEUED`
/// unless changed). Call counts are kept so tests can assert how many
/// queries a flow actually made. Optional delays keep a call in flight on
/// the tokio clock.
#[derive(Clone)]
pub struct ScriptedGateway {
    reference: PaymentReference,
    initiation_error: Option<String>,
    script: Arc<Vec<Step>>,
    otherwise: ProviderStatus,
    initiation_delay: Duration,
    query_delay: Duration,
    initiations: Arc<AtomicUsize>,
    queries: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: PaymentReference::new(reference),
            initiation_error: None,
            script: Arc::new(Vec::new()),
            otherwise: ProviderStatus::Queued,
            initiation_delay: Duration::ZERO,
            query_delay: Duration::ZERO,
            initiations: Arc::new(AtomicUsize::new(0)),
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every `initiate` call fail with `message`.
    pub fn failing_initiation(mut self, message: impl Into<String>) -> Self {
        self.initiation_error = Some(message.into());
        self
    }

    pub fn then_status(self, status: ProviderStatus) -> Self {
        self.push(Step::Status(status))
    }

    pub fn then_error(self, message: impl Into<String>) -> Self {
        self.push(Step::Error(message.into()))
    }

    pub fn otherwise(mut self, status: ProviderStatus) -> Self {
        self.otherwise = status;
        self
    }

    pub fn initiation_delay(mut self, delay: Duration) -> Self {
        self.initiation_delay = delay;
        self
    }

    pub fn query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    fn push(mut self, step: Step) -> Self {
        Arc::make_mut(&mut self.script).push(step);
        self
    }

    pub fn initiations(&self) -> usize {
        self.initiations.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate(&self, _request: &PaymentRequest) -> Result<InitiationReceipt> {
        self.initiations.fetch_add(1, Ordering::SeqCst);
        if !self.initiation_delay.is_zero() {
            sleep(self.initiation_delay).await;
        }
        if let Some(message) = &self.initiation_error {
            return Err(PaymentError::InitiationError(message.clone()));
        }
        Ok(InitiationReceipt {
            reference: self.reference.clone(),
            provider_state: ProviderStatus::Queued,
            checkout_id: None,
        })
    }

    async fn check_status(&self, _reference: &PaymentReference) -> Result<StatusReport> {
        let index = self.queries.fetch_add(1, Ordering::SeqCst);
        if !self.query_delay.is_zero() {
            sleep(self.query_delay).await;
        }
        match self.script.get(index).cloned() {
            Some(Step::Status(status)) => Ok(StatusReport::with_status(status)),
            Some(Step::Error(message)) => Err(PaymentError::TransientQuery(message)),
            None => Ok(StatusReport::with_status(self.otherwise.clone())),
        }
    }
}

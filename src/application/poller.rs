use crate::config::PollPolicy;
use crate::domain::payment::{PaymentReference, ProviderStatus};
use crate::domain::ports::GatewayBox;
use crate::error::{PaymentError, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a polling session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The provider reported `SUCCESS`.
    Confirmed,
    /// The provider reported `FAILED`, or a query error spelled out a decline.
    Declined,
    /// The attempt budget ran out without a terminal answer. The payment may
    /// still have gone through and has to be verified later.
    Undetermined,
}

/// One status query within a polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct PollAttempt {
    /// 1-based, strictly increasing, never above the configured maximum.
    pub sequence: u32,
    pub elapsed: Duration,
    /// What the attempt counted as. A failed query that is not a decline counts as `PENDING`.
    pub status: ProviderStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub reference: PaymentReference,
    pub outcome: Outcome,
    pub attempts: Vec<PollAttempt>,
    pub elapsed: Duration,
    /// Provider receipt number, when the confirming answer carried one.
    pub provider_reference: Option<String>,
    /// Message of the query error that caused a decline, if any.
    pub decline_reason: Option<String>,
}

/// Polls the gateway on a fixed cadence until a payment settles or the budget runs out.
///
/// Each attempt waits `interval` and then issues exactly one status query, so
/// attempts never overlap. A reference can only be polled by one session at a
/// time; a second concurrent `poll` for the same reference is rejected.
#[derive(Clone)]
pub struct ConfirmationPoller {
    gateway: GatewayBox,
    policy: PollPolicy,
    active: Arc<Mutex<HashSet<PaymentReference>>>,
}

/// Releases a reference from the active set when its session ends, however it ends.
struct ActiveSession {
    active: Arc<Mutex<HashSet<PaymentReference>>>,
    reference: PaymentReference,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.reference);
    }
}

impl ConfirmationPoller {
    pub fn new(gateway: GatewayBox, policy: PollPolicy) -> Self {
        Self {
            gateway,
            policy,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub async fn poll(&self, reference: &PaymentReference) -> Result<PollReport> {
        self.poll_cancellable(reference, &CancellationToken::new())
            .await
    }

    /// Like [`poll`](Self::poll), but stops before the next scheduled attempt
    /// once `cancel` fires and returns [`PaymentError::Closed`].
    ///
    /// A query that is already in flight is allowed to finish.
    pub async fn poll_cancellable(
        &self,
        reference: &PaymentReference,
        cancel: &CancellationToken,
    ) -> Result<PollReport> {
        let _session = self.claim(reference)?;
        let started = Instant::now();
        let mut attempts = Vec::with_capacity(self.policy.max_attempts as usize);

        info!(
            reference = %reference,
            interval_ms = self.policy.interval.as_millis() as u64,
            max_attempts = self.policy.max_attempts,
            "polling for payment confirmation"
        );

        for sequence in 1..=self.policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(reference = %reference, attempts = attempts.len(), "polling stopped by teardown");
                    return Err(PaymentError::Closed);
                }
                _ = sleep(self.policy.interval) => {}
            }

            let (status, error, provider_reference) =
                match self.gateway.check_status(reference).await {
                    Ok(report) => (report.status, None, report.provider_reference),
                    Err(e) if e.signals_decline() => {
                        (ProviderStatus::Failed, Some(error_message(e)), None)
                    }
                    Err(e) => {
                        warn!(reference = %reference, attempt = sequence, "status check failed, retrying: {}", e);
                        (ProviderStatus::Pending, Some(error_message(e)), None)
                    }
                };

            debug!(reference = %reference, attempt = sequence, status = %status, "poll attempt");

            attempts.push(PollAttempt {
                sequence,
                elapsed: started.elapsed(),
                status: status.clone(),
                error: error.clone(),
            });

            let outcome = match status {
                ProviderStatus::Success => Outcome::Confirmed,
                ProviderStatus::Failed => Outcome::Declined,
                _ => continue,
            };

            info!(reference = %reference, attempts = sequence, outcome = ?outcome, "payment settled");
            return Ok(PollReport {
                reference: reference.clone(),
                outcome,
                attempts,
                elapsed: started.elapsed(),
                provider_reference,
                decline_reason: error,
            });
        }

        info!(
            reference = %reference,
            attempts = attempts.len(),
            "no terminal status within the polling budget"
        );
        Ok(PollReport {
            reference: reference.clone(),
            outcome: Outcome::Undetermined,
            attempts,
            elapsed: started.elapsed(),
            provider_reference: None,
            decline_reason: None,
        })
    }

    fn claim(&self, reference: &PaymentReference) -> Result<ActiveSession> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(reference.clone()) {
            return Err(PaymentError::PollInProgress(reference.clone()));
        }
        Ok(ActiveSession {
            active: Arc::clone(&self.active),
            reference: reference.clone(),
        })
    }
}

fn error_message(error: PaymentError) -> String {
    match error {
        PaymentError::TransientQuery(message) | PaymentError::Declined(message) => message,
        other => other.to_string(),
    }
}

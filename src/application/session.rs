use super::initiator::PaymentInitiator;
use super::poller::{ConfirmationPoller, Outcome};
use crate::domain::payment::{Amount, PaymentReference};
use crate::domain::phone::PhoneNumber;
use crate::domain::transaction::{ConfirmationStatus, TransactionRecord};
use crate::error::{PaymentError, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the payment surface is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for the phone number.
    Idle,
    /// The payment prompt is being submitted.
    Processing,
    /// Waiting for the payer to approve on their phone.
    Polling { reference: PaymentReference },
    /// Shown for both confirmed and undetermined payments.
    Success,
    Error { message: String },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Processing => f.write_str("processing"),
            SessionState::Polling { .. } => f.write_str("polling"),
            SessionState::Success => f.write_str("success"),
            SessionState::Error { .. } => f.write_str("error"),
        }
    }
}

/// One payment surface: `Idle -> Processing -> Polling -> Success | Error`,
/// with `Error -> Idle` through [`retry`](Self::retry).
///
/// State changes are published on a `watch` channel. On `Success` the
/// finalized record is handed to the outcome callback after the display delay
/// and the session closes itself. [`close`](Self::close) tears the session
/// down from outside: no poll attempt is scheduled and no callback runs after it.
pub struct PaymentSession {
    amount: Amount,
    initiator: Arc<PaymentInitiator>,
    poller: ConfirmationPoller,
    success_delay: Duration,
    state: watch::Sender<SessionState>,
    teardown: CancellationToken,
    closed: AtomicBool,
}

impl PaymentSession {
    pub fn new(
        amount: Amount,
        initiator: Arc<PaymentInitiator>,
        poller: ConfirmationPoller,
        success_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            amount,
            initiator,
            poller,
            success_delay,
            state,
            teardown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Runs one full payment attempt for `phone` and returns the state it ended in.
    ///
    /// Only valid from `Idle`. `on_outcome` is called at most once, and only
    /// when the session reaches `Success` and was not closed in the meantime.
    /// Returns [`PaymentError::Closed`] when the session is torn down mid-flight.
    pub async fn submit<F>(&self, phone: &str, on_outcome: F) -> Result<SessionState>
    where
        F: FnOnce(TransactionRecord) + Send,
    {
        if self.is_closed() {
            return Err(PaymentError::Closed);
        }

        let next = match PhoneNumber::parse(phone) {
            Ok(_) => SessionState::Processing,
            Err(e) => SessionState::Error {
                message: e.to_string(),
            },
        };

        let mut rejected_from = None;
        self.state.send_if_modified(|state| {
            if *state == SessionState::Idle {
                *state = next.clone();
                true
            } else {
                rejected_from = Some(state.to_string());
                false
            }
        });
        if let Some(from) = rejected_from {
            return Err(PaymentError::InvalidTransition {
                from,
                action: "submit a payment",
            });
        }
        debug!("session state -> {}", next);

        if let SessionState::Error { message } = &next {
            warn!("payment failed: {}", message);
            return Ok(next);
        }

        let initiated = tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return Err(PaymentError::Closed),
            result = self.initiator.initiate(self.amount, phone) => result,
        };
        self.ensure_open()?;
        let receipt = match initiated {
            Ok(receipt) => receipt,
            Err(PaymentError::InitiationError(message)) => return Ok(self.fail(message)),
            Err(e) => return Ok(self.fail(e.to_string())),
        };

        self.transition(SessionState::Polling {
            reference: receipt.reference.clone(),
        });

        let polled = self
            .poller
            .poll_cancellable(&receipt.reference, &self.teardown)
            .await;
        // The last query may have been in flight when the session was closed.
        self.ensure_open()?;
        let report = match polled {
            Ok(report) => report,
            Err(e) => return Ok(self.fail(e.to_string())),
        };

        let confirmation = match report.outcome {
            Outcome::Confirmed => ConfirmationStatus::Success,
            // TODO: product review: an undetermined payment is shown as a success;
            // only the record's confirmation status keeps it apart.
            Outcome::Undetermined => ConfirmationStatus::Pending,
            Outcome::Declined => {
                let message = report
                    .decline_reason
                    .unwrap_or_else(|| "Payment declined".to_string());
                return Ok(self.fail(message));
            }
        };

        self.transition(SessionState::Success);

        tokio::select! {
            biased;
            _ = self.teardown.cancelled() => return Err(PaymentError::Closed),
            _ = sleep(self.success_delay) => {}
        }

        // Whoever flips `closed` first wins: either the record goes out, or close() did.
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PaymentError::Closed);
        }
        self.teardown.cancel();

        let record = TransactionRecord::top_up(&receipt.reference, self.amount, confirmation);
        info!(
            reference = %receipt.reference,
            record = %record.id,
            confirmation = ?confirmation,
            "payment session finished"
        );
        on_outcome(record);

        Ok(SessionState::Success)
    }

    /// Leaves `Error` for a fresh `Idle`. The next submit starts a brand-new payment.
    pub fn retry(&self) -> Result<()> {
        if self.is_closed() {
            return Err(PaymentError::Closed);
        }

        let mut rejected_from = None;
        self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Error { .. }) {
                *state = SessionState::Idle;
                true
            } else {
                rejected_from = Some(state.to_string());
                false
            }
        });

        match rejected_from {
            Some(from) => Err(PaymentError::InvalidTransition {
                from,
                action: "retry",
            }),
            None => {
                debug!("session state -> idle");
                Ok(())
            }
        }
    }

    /// Tears the session down. In-flight requests may still complete, but
    /// nothing further is scheduled and the outcome callback never runs.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(state = %self.state(), "payment session closed");
        }
        self.teardown.cancel();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.teardown.is_cancelled() {
            return Err(PaymentError::Closed);
        }
        Ok(())
    }

    fn transition(&self, next: SessionState) {
        debug!("session state -> {}", next);
        self.state.send_replace(next);
    }

    fn fail(&self, message: String) -> SessionState {
        warn!("payment failed: {}", message);
        let state = SessionState::Error { message };
        self.transition(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollPolicy;
    use crate::domain::payment::ProviderStatus;
    use crate::infrastructure::scripted::ScriptedGateway;
    use rust_decimal_macros::dec;

    fn session(gateway: &ScriptedGateway) -> PaymentSession {
        let gateway = Arc::new(gateway.clone());
        PaymentSession::new(
            Amount::new(dec!(100)).unwrap(),
            Arc::new(PaymentInitiator::new(gateway.clone())),
            ConfirmationPoller::new(gateway, PollPolicy::default()),
            Duration::from_millis(1500),
        )
    }

    #[tokio::test]
    async fn test_invalid_phone_goes_to_error_without_network() {
        let gateway = ScriptedGateway::new("MA3PAY-X");
        let session = session(&gateway);

        let state = session.submit("12345", |_| panic!("no record expected")).await.unwrap();

        assert!(matches!(state, SessionState::Error { .. }));
        assert_eq!(gateway.initiations(), 0);
    }

    #[tokio::test]
    async fn test_submit_only_from_idle() {
        let gateway = ScriptedGateway::new("MA3PAY-X").failing_initiation("boom");
        let session = session(&gateway);

        session.submit("0712345678", |_| {}).await.unwrap();
        let again = session.submit("0712345678", |_| {}).await;
        assert!(matches!(again, Err(PaymentError::InvalidTransition { .. })));

        session.retry().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.retry().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_closes_after_success() {
        let gateway = ScriptedGateway::new("MA3PAY-X").then_status(ProviderStatus::Success);
        let session = session(&gateway);

        let state = session.submit("0712345678", |_| {}).await.unwrap();
        assert_eq!(state, SessionState::Success);
        assert!(session.is_closed());
        assert!(matches!(
            session.submit("0712345678", |_| {}).await,
            Err(PaymentError::Closed)
        ));
    }
}

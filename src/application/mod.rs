//! Application layer: the payment flow itself.
//!
//! `PaymentInitiator` submits a payment prompt, `ConfirmationPoller` follows it
//! to a settled outcome, and `PaymentSession` is the state machine a payment
//! surface drives. `PaymentService` builds sessions from configured adapters.

pub mod initiator;
pub mod poller;
pub mod service;
pub mod session;

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use stkpay::application::service::PaymentService;
use stkpay::config::PollPolicy;
use stkpay::domain::payment::Amount;
use stkpay::domain::ports::{GatewayBox, RecordKeeper, RecordKeeperBox};
use stkpay::domain::transaction::RawTransaction;
use stkpay::error::{PaymentError, Result};
use stkpay::infrastructure::records::InMemoryRecordKeeper;

pub const SUCCESS_DELAY: Duration = Duration::from_millis(1500);

/// A backend that is always down.
#[derive(Default, Clone)]
pub struct UnreachableRecordKeeper {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RecordKeeper for UnreachableRecordKeeper {
    async fn notify_pending_deposit(&self, _amount: Amount) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PaymentError::TransientQuery("backend unreachable".to_string()))
    }

    async fn list_activity(&self) -> Result<Vec<RawTransaction>> {
        Err(PaymentError::TransientQuery("backend unreachable".to_string()))
    }
}

pub fn amount(value: rust_decimal::Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub fn hundred() -> Amount {
    amount(dec!(100))
}

pub fn service_with(gateway: GatewayBox, records: RecordKeeperBox) -> PaymentService {
    PaymentService::new(gateway, records, PollPolicy::default(), SUCCESS_DELAY)
}

pub fn service(gateway: GatewayBox) -> PaymentService {
    service_with(gateway, Arc::new(InMemoryRecordKeeper::new()))
}

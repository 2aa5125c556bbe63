use rust_decimal_macros::dec;
use std::sync::Arc;
use stkpay::config::SandboxSettings;
use stkpay::domain::payment::{Amount, PaymentRequest, ProviderStatus};
use stkpay::domain::phone::PhoneNumber;
use stkpay::domain::ports::{GatewayBox, PaymentGateway, RecordKeeper, RecordKeeperBox};
use stkpay::infrastructure::records::InMemoryRecordKeeper;
use stkpay::infrastructure::sandbox::SandboxGateway;

#[tokio::test(start_paused = true)]
async fn test_adapters_as_trait_objects() {
    let gateway: GatewayBox = Arc::new(SandboxGateway::new(SandboxSettings::default(), "MA3PAY"));
    let records: RecordKeeperBox = Arc::new(InMemoryRecordKeeper::new());

    let request = PaymentRequest {
        amount: Amount::new(dec!(250)).unwrap(),
        phone: PhoneNumber::parse("0112345678").unwrap(),
    };

    // Verify Send + Sync by spawning tasks
    let gw_handle = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            let receipt = gateway.initiate(&request).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(6)).await;
            gateway.check_status(&receipt.reference).await.unwrap()
        })
    };

    let rk_handle = {
        let records = Arc::clone(&records);
        tokio::spawn(async move {
            records
                .notify_pending_deposit(Amount::new(dec!(250)).unwrap())
                .await
                .unwrap();
            records.list_activity().await.unwrap()
        })
    };

    let report = gw_handle.await.unwrap();
    assert_eq!(report.status, ProviderStatus::Success);
    assert_eq!(report.amount, Some(dec!(250)));
    assert_eq!(report.phone_number.as_deref(), Some("254112345678"));

    let activity = rk_handle.await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].amount, dec!(250));
}

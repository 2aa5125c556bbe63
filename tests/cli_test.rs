use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn stkpay() -> Command {
    let mut cmd = Command::new(cargo_bin!("stkpay"));
    cmd.env("STKPAY_GATEWAY", "sandbox")
        .env("STKPAY_POLL_INTERVAL_MS", "10")
        .env("STKPAY_SANDBOX_LATENCY_MS", "0")
        .env("STKPAY_SANDBOX_CONFIRM_AFTER_MS", "15")
        .env("STKPAY_SUCCESS_DELAY_MS", "0")
        .env_remove("STKPAY_BACKEND_URL");
    cmd
}

#[test]
fn test_cli_sandbox_payment_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = stkpay();
    cmd.args(["pay", "--amount", "100", "--phone", "0712345678"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""confirmation_status": "SUCCESS""#))
        .stdout(predicate::str::contains(r#""id": "PH-MA3PAY-"#))
        .stdout(predicate::str::contains("Mobile money top up"));

    Ok(())
}

#[test]
fn test_cli_rejects_invalid_phone() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = stkpay();
    cmd.args(["pay", "--amount", "100", "--phone", "12345"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Payment failed"));

    Ok(())
}

#[test]
fn test_cli_rejects_non_positive_amount() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = stkpay();
    cmd.args(["pay", "--amount", "0", "--phone", "0712345678"]);

    cmd.assert().failure();

    Ok(())
}

#[test]
fn test_cli_activity_without_backend_is_empty() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = stkpay();
    cmd.arg("activity");

    cmd.assert().success().stdout(predicate::str::contains("[]"));

    Ok(())
}

use crate::config::BackendSettings;
use crate::domain::payment::Amount;
use crate::domain::ports::RecordKeeper;
use crate::domain::transaction::RawTransaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, header};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, warn};

/// Keeps pending deposits in process memory.
///
/// Used when no wallet backend is configured; `list_activity` returns the
/// deposits noted so far.
#[derive(Default, Clone)]
pub struct InMemoryRecordKeeper {
    deposits: Arc<RwLock<Vec<RawTransaction>>>,
}

impl InMemoryRecordKeeper {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordKeeper for InMemoryRecordKeeper {
    async fn notify_pending_deposit(&self, amount: Amount) -> Result<()> {
        let mut deposits = self.deposits.write().await;
        let id = deposits.len() + 1;
        deposits.push(RawTransaction {
            id: serde_json::json!(id),
            r#type: "DEPOSIT".to_string(),
            amount: amount.value(),
            created_at: Utc::now(),
            description: Some("Pending deposit".to_string()),
        });
        Ok(())
    }

    async fn list_activity(&self) -> Result<Vec<RawTransaction>> {
        Ok(self.deposits.read().await.clone())
    }
}

#[derive(Debug, Serialize)]
struct DepositNotice {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

/// The wallet backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRecordKeeper {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpRecordKeeper {
    pub fn new(settings: &BackendSettings, timeout: Duration) -> Result<Self> {
        let base_url = settings.base_url.clone().ok_or_else(|| {
            PaymentError::ConfigError("STKPAY_BACKEND_URL is not set".to_string())
        })?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            token: settings.token.clone(),
            client,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl RecordKeeper for HttpRecordKeeper {
    async fn notify_pending_deposit(&self, amount: Amount) -> Result<()> {
        let request = self
            .client
            .post(format!("{}/wallet/deposit", self.base_url))
            .json(&DepositNotice {
                amount: amount.value(),
            });

        self.authorized(request).send().await?.error_for_status()?;
        Ok(())
    }

    async fn list_activity(&self) -> Result<Vec<RawTransaction>> {
        let request = self.client.get(format!("{}/wallet/activity", self.base_url));
        let body: serde_json::Value = self
            .authorized(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_activity(body))
    }
}

/// Reads an activity body entry by entry. Entries that do not parse are skipped.
fn parse_activity(body: serde_json::Value) -> Vec<RawTransaction> {
    let serde_json::Value::Array(entries) = body else {
        error!("unexpected activity response: {}", body);
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RawTransaction>(entry.clone()) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("skipping malformed activity entry {}: {}", entry, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_record_keeper() {
        let keeper = InMemoryRecordKeeper::new();
        keeper
            .notify_pending_deposit(Amount::new(dec!(100)).unwrap())
            .await
            .unwrap();

        let activity = keeper.list_activity().await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].r#type, "DEPOSIT");
        assert_eq!(activity[0].amount, dec!(100));
    }

    #[test]
    fn test_activity_skips_malformed_entries() {
        let body = serde_json::json!([
            {"id": 1, "type": "DEPOSIT", "amount": "100", "createdAt": "2026-01-02T10:00:00Z", "description": "Top up"},
            {"id": 2, "type": "TRANSFER", "amount": "-30", "createdAt": "2026-01-02T11:00:00Z", "description": null},
            {"id": 3, "type": "DEPOSIT", "amount": "5"},
            "garbage"
        ]);

        let activity = parse_activity(body);

        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].description.as_deref(), Some("Top up"));
        assert_eq!(activity[1].description, None);
        assert_eq!(activity[1].amount, dec!(-30));
    }

    #[test]
    fn test_non_array_activity_is_empty() {
        let body = serde_json::json!({"error": "unauthorized"});
        assert!(parse_activity(body).is_empty());
    }

    #[test]
    fn test_http_record_keeper_requires_url() {
        let result = HttpRecordKeeper::new(&BackendSettings::default(), Duration::from_secs(5));
        assert!(matches!(result, Err(PaymentError::ConfigError(_))));
    }
}

use crate::config::PayHeroSettings;
use crate::domain::payment::{
    InitiationReceipt, PaymentReference, PaymentRequest, ProviderStatus, StatusReport,
};
use crate::domain::ports::PaymentGateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, header};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct StkPushRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub phone_number: String,
    pub channel_id: u32,
    pub provider: String,
    pub external_reference: String,
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StkPushResponse {
    pub status: Option<String>,
    pub reference: Option<String>,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionStatusResponse {
    pub status: Option<String>,
    pub amount: Option<Decimal>,
    pub phone_number: Option<String>,
    pub provider_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_message: Option<String>,
    message: Option<String>,
}

/// The live PayHero gateway: STK push initiation and transaction status lookups.
#[derive(Debug, Clone)]
pub struct PayHeroGateway {
    settings: PayHeroSettings,
    reference_prefix: String,
    client: Client,
}

impl PayHeroGateway {
    pub fn new(settings: PayHeroSettings, reference_prefix: impl Into<String>) -> Result<Self> {
        if settings.auth_token.is_none() {
            return Err(PaymentError::ConfigError(
                "PayHero credentials are not configured".to_string(),
            ));
        }

        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            settings,
            reference_prefix: reference_prefix.into(),
            client,
        })
    }

    fn authorization(&self) -> String {
        format!("Basic {}", self.settings.auth_token.as_deref().unwrap_or_default())
    }
}

#[async_trait]
impl PaymentGateway for PayHeroGateway {
    async fn initiate(&self, request: &PaymentRequest) -> Result<InitiationReceipt> {
        let external_reference = PaymentReference::synthesize(&self.reference_prefix);
        let payload = StkPushRequest {
            amount: request.amount.value(),
            phone_number: request.phone.to_string(),
            channel_id: self.settings.channel_id,
            provider: self.settings.provider.clone(),
            external_reference: external_reference.to_string(),
            callback_url: self.settings.callback_url.clone(),
        };

        info!(
            reference = %external_reference,
            amount = %request.amount,
            phone = %request.phone,
            "submitting STK push"
        );

        let response = self
            .client
            .post(format!("{}/payments", self.settings.base_url))
            .header(header::AUTHORIZATION, self.authorization())
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::InitiationError(e.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response, "Failed to initiate payment").await;
            error!(reference = %external_reference, "STK push rejected: {}", message);
            return Err(PaymentError::InitiationError(message));
        }

        let body: StkPushResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::InitiationError(e.to_string()))?;

        Ok(InitiationReceipt {
            reference: body
                .reference
                .map(PaymentReference::new)
                .unwrap_or(external_reference),
            provider_state: body
                .status
                .map(ProviderStatus::from)
                .unwrap_or(ProviderStatus::Queued),
            checkout_id: body.checkout_request_id,
        })
    }

    async fn check_status(&self, reference: &PaymentReference) -> Result<StatusReport> {
        let response = self
            .client
            .get(format!("{}/transaction-status", self.settings.base_url))
            .query(&[("reference", reference.as_str())])
            .header(header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(|e| PaymentError::TransientQuery(e.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response, "Status check failed").await;
            error!(reference = %reference, "status check rejected: {}", message);
            return Err(PaymentError::TransientQuery(message));
        }

        let body: TransactionStatusResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::TransientQuery(e.to_string()))?;

        Ok(StatusReport {
            status: body
                .status
                .map(ProviderStatus::from)
                .unwrap_or(ProviderStatus::Pending),
            amount: body.amount,
            phone_number: body.phone_number,
            provider_reference: body.provider_reference,
        })
    }
}

/// Picks the most specific message out of an error response.
async fn failure_message(response: Response, fallback: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_from_body(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("{}: HTTP {}", fallback, status)
        } else {
            format!("{}: HTTP {} - {}", fallback, status, body.trim())
        }
    })
}

fn error_from_body(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error_message
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

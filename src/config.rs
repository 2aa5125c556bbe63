use crate::error::{PaymentError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as base64};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which gateway implementation backs the payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Sandbox,
    Live,
}

impl FromStr for GatewayMode {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(GatewayMode::Sandbox),
            "live" | "production" => Ok(GatewayMode::Live),
            other => Err(PaymentError::ConfigError(format!(
                "unknown gateway mode '{}'",
                other
            ))),
        }
    }
}

/// Fixed polling cadence: no backoff, a hard attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxSettings {
    pub latency: Duration,
    pub confirm_after: Duration,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1500),
            confirm_after: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayHeroSettings {
    pub base_url: String,
    /// Value placed after `Basic ` in the `Authorization` header.
    pub auth_token: Option<String>,
    pub channel_id: u32,
    pub provider: String,
    pub callback_url: String,
    pub timeout: Duration,
}

impl Default for PayHeroSettings {
    fn default() -> Self {
        Self {
            base_url: "https://backend.payhero.co.ke/api/v2".to_string(),
            auth_token: None,
            channel_id: 133,
            provider: "m-pesa".to_string(),
            callback_url: "https://example.com/callback".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSettings {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gateway: GatewayMode,
    pub reference_prefix: String,
    pub poll: PollPolicy,
    pub success_delay: Duration,
    pub sandbox: SandboxSettings,
    pub payhero: PayHeroSettings,
    pub backend: BackendSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayMode::Sandbox,
            reference_prefix: "MA3PAY".to_string(),
            poll: PollPolicy::default(),
            success_delay: Duration::from_millis(1500),
            sandbox: SandboxSettings::default(),
            payhero: PayHeroSettings::default(),
            backend: BackendSettings::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut cfg = Self::default();

        if let Some(mode) = var("STKPAY_GATEWAY") {
            cfg.gateway = mode.parse()?;
        }
        if let Some(prefix) = var("STKPAY_REFERENCE_PREFIX") {
            cfg.reference_prefix = prefix;
        }

        cfg.poll.interval = millis("STKPAY_POLL_INTERVAL_MS", cfg.poll.interval)?;
        cfg.poll.max_attempts = parsed("STKPAY_POLL_MAX_ATTEMPTS", cfg.poll.max_attempts)?;
        if cfg.poll.max_attempts == 0 {
            return Err(PaymentError::ConfigError(
                "STKPAY_POLL_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        cfg.success_delay = millis("STKPAY_SUCCESS_DELAY_MS", cfg.success_delay)?;

        cfg.sandbox.latency = millis("STKPAY_SANDBOX_LATENCY_MS", cfg.sandbox.latency)?;
        cfg.sandbox.confirm_after =
            millis("STKPAY_SANDBOX_CONFIRM_AFTER_MS", cfg.sandbox.confirm_after)?;

        if let Some(url) = var("PAYHERO_BASE_URL") {
            cfg.payhero.base_url = url.trim_end_matches('/').to_string();
        }
        cfg.payhero.auth_token = var("PAYHERO_AUTH_TOKEN").or_else(|| {
            let username = var("PAYHERO_API_USERNAME")?;
            let password = var("PAYHERO_API_PASSWORD")?;
            Some(base64.encode(format!("{}:{}", username, password)))
        });
        cfg.payhero.channel_id = parsed("PAYHERO_CHANNEL_ID", cfg.payhero.channel_id)?;
        if let Some(url) = var("PAYHERO_CALLBACK_URL") {
            cfg.payhero.callback_url = url;
        }
        if let Some(provider) = var("STKPAY_PROVIDER") {
            cfg.payhero.provider = provider;
        }
        cfg.payhero.timeout = Duration::from_secs(parsed(
            "STKPAY_HTTP_TIMEOUT_SECS",
            cfg.payhero.timeout.as_secs(),
        )?);

        cfg.backend.base_url = var("STKPAY_BACKEND_URL").map(|u| u.trim_end_matches('/').to_string());
        cfg.backend.token = var("STKPAY_BACKEND_TOKEN");

        if cfg.gateway == GatewayMode::Live && cfg.payhero.auth_token.is_none() {
            return Err(PaymentError::ConfigError(
                "live gateway requires PAYHERO_AUTH_TOKEN or PAYHERO_API_USERNAME/PAYHERO_API_PASSWORD"
                    .to_string(),
            ));
        }

        Ok(cfg)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PaymentError::ConfigError(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

fn millis(key: &str, default: Duration) -> Result<Duration> {
    parsed(key, default.as_millis() as u64).map(Duration::from_millis)
}

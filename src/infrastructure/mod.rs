//! Adapters behind the domain ports: gateways and record keepers.

pub mod payhero;
pub mod records;
pub mod sandbox;
pub mod scripted;

use crate::config::{Config, GatewayMode};
use crate::domain::ports::{GatewayBox, RecordKeeperBox};
use crate::error::Result;
use payhero::PayHeroGateway;
use records::{HttpRecordKeeper, InMemoryRecordKeeper};
use sandbox::SandboxGateway;
use std::sync::Arc;
use tracing::info;

/// Builds the gateway selected by `config.gateway`.
pub fn build_gateway(config: &Config) -> Result<GatewayBox> {
    match config.gateway {
        GatewayMode::Sandbox => {
            info!("using sandbox gateway");
            Ok(Arc::new(SandboxGateway::new(
                config.sandbox.clone(),
                config.reference_prefix.clone(),
            )))
        }
        GatewayMode::Live => {
            info!(base_url = %config.payhero.base_url, "using live PayHero gateway");
            Ok(Arc::new(PayHeroGateway::new(
                config.payhero.clone(),
                config.reference_prefix.clone(),
            )?))
        }
    }
}

/// Builds the wallet backend client, or an in-memory keeper when no backend is configured.
pub fn build_record_keeper(config: &Config) -> Result<RecordKeeperBox> {
    if config.backend.base_url.is_some() {
        Ok(Arc::new(HttpRecordKeeper::new(
            &config.backend,
            config.payhero.timeout,
        )?))
    } else {
        Ok(Arc::new(InMemoryRecordKeeper::new()))
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! Logging setup.
//!
//! Verification emits `debug!` events per state transition, `info!` on
//! acceptance and `warn!` on rejection. Link tags only ever appear
//! shortened.

use crate::config::TelemetryConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Build the level filter: `RUST_LOG` wins, then the configured directive,
/// then `verbose`.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = match &config.filter {
        Some(filter) => filter.clone(),
        None if config.verbose => "debug".to_string(),
        None => "info".to_string(),
    };
    EnvFilter::try_new(&directive).map_err(|e| anyhow!("invalid log filter {directive:?}: {e}"))
}

/// Install a global fmt subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(env_filter(config)?);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

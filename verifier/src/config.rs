// Copyright (c) 2018-2025 The Botho Foundation

use anyhow::{Context, Result};
use pcr_crypto_range_proof::RangeProofKind;
use pcr_crypto_ring_signature::RingSignatureKind;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Verifier configuration, loaded from TOML.
///
/// ```toml
/// allow_expired_tokens = false
/// nonce_retention_s = 300
/// range_proof_backend = "bulletproofs"
/// ring_signature_backend = "lsag-ristretto-v1"
///
/// [speed_check]
/// enabled = true
/// max_speed_kmh = 50.0
/// tolerance_m = 150.0
///
/// [telemetry]
/// verbose = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Skip the token expiry check. Replay protection still applies.
    #[serde(default)]
    pub allow_expired_tokens: bool,

    /// Seconds a spent token nonce is kept after the token expires. Ignored
    /// while `allow_expired_tokens` is set, when nonces are kept forever.
    #[serde(default = "default_nonce_retention_s")]
    pub nonce_retention_s: u64,

    #[serde(default)]
    pub range_proof_backend: RangeProofKind,

    #[serde(default)]
    pub ring_signature_backend: RingSignatureKind,

    #[serde(default)]
    pub speed_check: SpeedCheckConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            allow_expired_tokens: false,
            nonce_retention_s: default_nonce_retention_s(),
            range_proof_backend: RangeProofKind::default(),
            ring_signature_backend: RingSignatureKind::default(),
            speed_check: SpeedCheckConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Plausibility check between a vehicle's consecutive reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedCheckConfig {
    #[serde(default = "default_speed_check_enabled")]
    pub enabled: bool,

    /// Highest plausible speed between two reports.
    #[serde(default = "default_max_speed_kmh")]
    pub max_speed_kmh: f64,

    /// Slack added to the reachable distance, covering the size of a
    /// geohash cell.
    #[serde(default = "default_tolerance_m")]
    pub tolerance_m: f64,
}

impl Default for SpeedCheckConfig {
    fn default() -> Self {
        Self {
            enabled: default_speed_check_enabled(),
            max_speed_kmh: default_max_speed_kmh(),
            tolerance_m: default_tolerance_m(),
        }
    }
}

fn default_nonce_retention_s() -> u64 {
    300
}

fn default_speed_check_enabled() -> bool {
    true
}

fn default_max_speed_kmh() -> f64 {
    50.0
}

fn default_tolerance_m() -> f64 {
    150.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log at debug level.
    #[serde(default)]
    pub verbose: bool,

    /// An `EnvFilter` directive overriding `verbose`, e.g.
    /// `"pcr_verifier=debug,info"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl VerifierConfig {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }
}

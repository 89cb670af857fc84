// Copyright (c) 2018-2025 The Botho Foundation

//! RSU-issued submission tokens.
//!
//! A roadside unit hands out one token per time window. The verifier checks
//! freshness and single use; the issuer signature is checked upstream.

use pcr_core_types::{append_length_prefixed, UnixTimestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const TOKEN_VERSION: u32 = 1;

const TOKEN_COMMITMENT_DOMAIN_TAG: &[u8] = b"pcr_token_commitment";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RsuToken {
    pub version: u32,
    pub region_id: String,
    pub window_id: u64,
    pub nonce: u64,
    pub expiry_ts: UnixTimestamp,
    pub issuer_id: String,
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

impl RsuToken {
    /// Replay key: a token may be spent once per `(window_id, nonce)`.
    pub fn replay_key(&self) -> (u64, u64) {
        (self.window_id, self.nonce)
    }

    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expiry_ts < now
    }

    /// Digest of every token field, signed as part of the report.
    pub fn commitment(&self) -> [u8; 32] {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        append_length_prefixed(&mut buf, self.region_id.as_bytes());
        buf.extend_from_slice(&self.window_id.to_le_bytes());
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.expiry_ts.to_le_bytes());
        append_length_prefixed(&mut buf, self.issuer_id.as_bytes());
        append_length_prefixed(&mut buf, &self.signature);

        let mut hasher = Sha256::new();
        hasher.update(TOKEN_COMMITMENT_DOMAIN_TAG);
        hasher.update(&buf);
        hasher.finalize().into()
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! The Proof-Carrying Report, version 1.
//!
//! This is the single serialization boundary of the system. On the wire a
//! report is JSON with a fixed field order, byte strings in hex, and unknown
//! fields rejected:
//!
//! ```text
//! version, task_id, token, cell_id, timestamp,
//! geo_proof { root, index, siblings },
//! time_proof { commitment, proof },
//! signature { ring_id, task_id, signature, link_tag, context, ring_size, backend },
//! payload
//! ```
//!
//! The ring signature covers [`ProofCarryingReport::canonical_message`], a
//! length-prefixed binary encoding of everything but the signature itself.

use crate::token::RsuToken;
use pcr_core_types::{append_length_prefixed, TaskId, UnixTimestamp};
use pcr_crypto_merkle::{MerkleHash, MerkleProof, MerkleRoot};
use pcr_crypto_range_proof::{RangeCommitment, RangeProof};
use pcr_crypto_ring_signature::RingSignature;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const REPORT_VERSION: u32 = 1;

const REPORT_MESSAGE_DOMAIN_TAG: &[u8] = b"pcr_report_message";
const GEO_COMMITMENT_DOMAIN_TAG: &[u8] = b"pcr_geo_commitment";
const TIME_COMMITMENT_DOMAIN_TAG: &[u8] = b"pcr_time_commitment";
const REPORT_DIGEST_DOMAIN_TAG: &[u8] = b"pcr_report_digest";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("malformed report: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Whitelist membership proof for the report's cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoProof {
    pub root: MerkleRoot,
    pub index: u64,
    pub siblings: Vec<MerkleHash>,
}

impl GeoProof {
    pub fn merkle_proof(&self) -> MerkleProof {
        MerkleProof {
            siblings: self.siblings.clone(),
        }
    }
}

/// Range proof that the committed timestamp lies in the task window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeProof {
    pub commitment: RangeCommitment,
    pub proof: RangeProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofCarryingReport {
    pub version: u32,
    pub task_id: TaskId,
    pub token: RsuToken,
    /// Geohash cell of the report; a whitelist leaf.
    pub cell_id: String,
    pub timestamp: UnixTimestamp,
    pub geo_proof: GeoProof,
    pub time_proof: TimeProof,
    pub signature: RingSignature,
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
}

/// Digest of the cell and its whitelist proof.
pub fn geo_commitment(cell_id: &str, geo_proof: &GeoProof) -> [u8; 32] {
    let mut buf = Vec::new();
    append_length_prefixed(&mut buf, cell_id.as_bytes());
    buf.extend_from_slice(geo_proof.root.as_bytes());
    buf.extend_from_slice(&geo_proof.index.to_le_bytes());
    buf.extend_from_slice(&(geo_proof.siblings.len() as u64).to_le_bytes());
    for sibling in &geo_proof.siblings {
        buf.extend_from_slice(sibling.as_bytes());
    }

    let mut hasher = Sha256::new();
    hasher.update(GEO_COMMITMENT_DOMAIN_TAG);
    hasher.update(&buf);
    hasher.finalize().into()
}

/// Digest of the range commitment and its proof.
pub fn time_commitment(time_proof: &TimeProof) -> [u8; 32] {
    let mut buf = Vec::with_capacity(48 + time_proof.proof.as_bytes().len());
    buf.extend_from_slice(time_proof.commitment.as_bytes());
    append_length_prefixed(&mut buf, time_proof.proof.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(TIME_COMMITMENT_DOMAIN_TAG);
    hasher.update(&buf);
    hasher.finalize().into()
}

/// The fields a report signature covers, laid out independently of any
/// signature so that a vehicle can build the message before signing.
pub struct ReportMessage<'a> {
    pub version: u32,
    pub task_id: &'a TaskId,
    pub token: &'a RsuToken,
    pub cell_id: &'a str,
    pub timestamp: UnixTimestamp,
    pub geo_proof: &'a GeoProof,
    pub time_proof: &'a TimeProof,
    pub payload: &'a [u8],
}

impl ReportMessage<'_> {
    /// `"pcr_report_message" || version || task_id || geo_commitment ||
    /// time_commitment || token_commitment || payload_digest || timestamp`
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload_digest: [u8; 32] = Sha256::digest(self.payload).into();

        let mut buf = Vec::with_capacity(REPORT_MESSAGE_DOMAIN_TAG.len() + 4 + 8 * 2 + 32 * 4 + 64);
        buf.extend_from_slice(REPORT_MESSAGE_DOMAIN_TAG);
        buf.extend_from_slice(&self.version.to_le_bytes());
        append_length_prefixed(&mut buf, self.task_id.as_bytes());
        buf.extend_from_slice(&geo_commitment(self.cell_id, self.geo_proof));
        buf.extend_from_slice(&time_commitment(self.time_proof));
        buf.extend_from_slice(&self.token.commitment());
        buf.extend_from_slice(&payload_digest);
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf
    }
}

impl ProofCarryingReport {
    fn message(&self) -> ReportMessage<'_> {
        ReportMessage {
            version: self.version,
            task_id: &self.task_id,
            token: &self.token,
            cell_id: &self.cell_id,
            timestamp: self.timestamp,
            geo_proof: &self.geo_proof,
            time_proof: &self.time_proof,
            payload: &self.payload,
        }
    }

    /// The bytes covered by the ring signature.
    pub fn canonical_message(&self) -> Vec<u8> {
        self.message().to_bytes()
    }

    /// Digest of the whole report, signature included. Recorded in the
    /// duplicate ledger.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(REPORT_DIGEST_DOMAIN_TAG);
        hasher.update(self.canonical_message());
        hasher.update(&self.signature.signature);
        hasher.update(self.signature.link_tag.as_bytes());
        hasher.finalize().into()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ReportError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ReportError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TOKEN_VERSION;
    use pcr_crypto_ring_signature::{LinkTag, RingId};

    fn report() -> ProofCarryingReport {
        let task_id = TaskId::from("T1");
        ProofCarryingReport {
            version: REPORT_VERSION,
            task_id: task_id.clone(),
            token: RsuToken {
                version: TOKEN_VERSION,
                region_id: "ROAD_SEG_A".into(),
                window_id: 1,
                nonce: 2,
                expiry_ts: 3,
                issuer_id: "rsu".into(),
                signature: vec![1, 2, 3],
            },
            cell_id: "g2".into(),
            timestamp: 1_200,
            geo_proof: GeoProof {
                root: MerkleHash([1; 32]),
                index: 1,
                siblings: vec![MerkleHash([2; 32]), MerkleHash([3; 32])],
            },
            time_proof: TimeProof {
                commitment: RangeCommitment([4; 32]),
                proof: RangeProof(vec![5; 16]),
            },
            signature: RingSignature {
                ring_id: RingId::compute(&task_id, &[]),
                task_id,
                signature: vec![6; 8],
                link_tag: LinkTag::from([7; 32]),
                context: b"pcr|T1|v1".to_vec(),
                ring_size: 8,
                backend: "lsag-ristretto-v1".into(),
            },
            payload: b"{}".to_vec(),
        }
    }

    #[test]
    fn signed_message_covers_every_unsigned_field() {
        let base = report();
        let message = base.canonical_message();

        let edits: [fn(&mut ProofCarryingReport); 8] = [
            |r| r.task_id = TaskId::from("T2"),
            |r| r.token.nonce += 1,
            |r| r.cell_id = "g3".into(),
            |r| r.timestamp += 1,
            |r| r.geo_proof.index = 0,
            |r| r.geo_proof.siblings.truncate(1),
            |r| r.time_proof.proof.0[0] ^= 1,
            |r| r.payload.push(b' '),
        ];
        for edit in edits {
            let mut changed = base.clone();
            edit(&mut changed);
            assert_ne!(changed.canonical_message(), message);
        }
    }

    #[test]
    fn signature_is_outside_the_message_but_inside_the_digest() {
        let base = report();
        let mut resigned = base.clone();
        resigned.signature.signature = vec![9; 8];

        assert_eq!(resigned.canonical_message(), base.canonical_message());
        assert_ne!(resigned.digest(), base.digest());
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let mut value = serde_json::to_value(report()).unwrap();
        value["time_proof"]["opening"] = serde_json::json!("00");
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            ProofCarryingReport::from_json(&bytes),
            Err(ReportError::Malformed(_))
        ));
    }
}

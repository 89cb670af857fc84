// Copyright (c) 2018-2025 The Botho Foundation

//! Vehicle-side report construction.

use crate::{
    config::VerifierConfig,
    error::VerifierError,
    policy::TaskPolicy,
    report::{GeoProof, ProofCarryingReport, ReportMessage, TimeProof, REPORT_VERSION},
    token::RsuToken,
};
use pcr_account_keys::TaskKey;
use pcr_core_types::UnixTimestamp;
use pcr_crypto_merkle::MerkleWhitelist;
use pcr_crypto_range_proof::{Blinding, RangeProofError, RangeProofScheme};
use pcr_crypto_ring_signature::{LinkableRingScheme, PublicKeyRing};
use rand_core::CryptoRngCore;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("cell {0:?} is not on the task whitelist")]
    CellNotWhitelisted(String),

    #[error("time proof: {0}")]
    TimeProof(#[from] RangeProofError),

    #[error("ring signature: {0}")]
    Signature(#[from] pcr_crypto_ring_signature::Error),
}

/// The caller-chosen parts of a report.
#[derive(Clone, Debug)]
pub struct ReportDraft {
    pub token: RsuToken,
    pub cell_id: String,
    pub timestamp: UnixTimestamp,
    pub payload: Vec<u8>,
}

/// Builds signed reports with the same backends a verifier is configured
/// with.
#[derive(Clone)]
pub struct ReportAssembler {
    range_proofs: Arc<dyn RangeProofScheme>,
    ring_scheme: Arc<dyn LinkableRingScheme>,
}

impl ReportAssembler {
    pub fn new(config: &VerifierConfig) -> Result<Self, VerifierError> {
        Ok(Self {
            range_proofs: config.range_proof_backend.build()?,
            ring_scheme: config.ring_signature_backend.build(),
        })
    }

    /// Prove the draft's cell and timestamp against `policy`, then sign the
    /// report with `key` on behalf of `ring`.
    pub fn assemble(
        &self,
        key: &TaskKey,
        ring: &PublicKeyRing,
        policy: &TaskPolicy,
        whitelist: &MerkleWhitelist,
        draft: ReportDraft,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<ProofCarryingReport, AssemblyError> {
        let (index, proof) = whitelist
            .prove_leaf(draft.cell_id.as_bytes())
            .ok_or_else(|| AssemblyError::CellNotWhitelisted(draft.cell_id.clone()))?;
        let geo_proof = GeoProof {
            root: whitelist.root(),
            index,
            siblings: proof.siblings,
        };

        let blinding = Blinding::from_random(rng);
        let (commitment, proof) = self.range_proofs.prove(
            draft.timestamp,
            policy.window_lower,
            policy.window_upper,
            &blinding,
            rng,
        )?;
        let time_proof = TimeProof { commitment, proof };

        let message = ReportMessage {
            version: REPORT_VERSION,
            task_id: &policy.task_id,
            token: &draft.token,
            cell_id: &draft.cell_id,
            timestamp: draft.timestamp,
            geo_proof: &geo_proof,
            time_proof: &time_proof,
            payload: &draft.payload,
        }
        .to_bytes();

        let signer_index = ring.index_of(key.derived_pk())?;
        let signature = self.ring_scheme.sign(
            &message,
            ring,
            signer_index,
            key.derived_sk(),
            &policy.context,
            rng,
        )?;
        debug!(task_id = %policy.task_id, link_tag = %signature.link_tag.short(), "assembled report");

        Ok(ProofCarryingReport {
            version: REPORT_VERSION,
            task_id: policy.task_id.clone(),
            token: draft.token,
            cell_id: draft.cell_id,
            timestamp: draft.timestamp,
            geo_proof,
            time_proof,
            signature,
            payload: draft.payload,
        })
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! Hash-commitment backend whose proof carries the opening.
//!
//! Not hiding. It exists so that tests exercising the rest of the pipeline do
//! not pay for Bulletproofs.

use crate::{check_bounds, Blinding, RangeCommitment, RangeProof, RangeProofError, RangeProofScheme};
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};

const COMMITMENT_DOMAIN_TAG: &[u8] = b"pcr_transparent_range_commitment";
const PROOF_LEN: usize = 8 + 32;

pub struct TransparentRangeProof;

fn commit(value: u64, blinding: &[u8; 32]) -> RangeCommitment {
    let mut hasher = Sha256::new();
    hasher.update(COMMITMENT_DOMAIN_TAG);
    hasher.update(value.to_le_bytes());
    hasher.update(blinding);
    RangeCommitment(hasher.finalize().into())
}

impl RangeProofScheme for TransparentRangeProof {
    fn backend(&self) -> &'static str {
        "transparent"
    }

    fn prove(
        &self,
        value: u64,
        lower: u64,
        upper: u64,
        blinding: &Blinding,
        _rng: &mut dyn CryptoRngCore,
    ) -> Result<(RangeCommitment, RangeProof), RangeProofError> {
        check_bounds(value, lower, upper)?;
        let blinding = blinding.as_scalar().to_bytes();
        let mut proof = Vec::with_capacity(PROOF_LEN);
        proof.extend_from_slice(&value.to_le_bytes());
        proof.extend_from_slice(&blinding);
        Ok((commit(value, &blinding), RangeProof(proof)))
    }

    fn verify(
        &self,
        lower: u64,
        upper: u64,
        commitment: &RangeCommitment,
        proof: &RangeProof,
    ) -> bool {
        if proof.0.len() != PROOF_LEN {
            return false;
        }
        let (value, blinding) = proof.0.split_at(8);
        let Ok(value) = <[u8; 8]>::try_from(value).map(u64::from_le_bytes) else {
            return false;
        };
        let Ok(blinding) = <[u8; 32]>::try_from(blinding) else {
            return false;
        };
        check_bounds(value, lower, upper).is_ok() && commit(value, &blinding) == *commitment
    }
}

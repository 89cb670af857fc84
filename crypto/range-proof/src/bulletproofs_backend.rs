// Copyright (c) 2018-2025 The Botho Foundation

//! Bulletproofs backend.
//!
//! The committed value `v` uses a Pedersen commitment `C = v*B + r*B'`. The
//! proof is an aggregated 64-bit Bulletproof for the two values `v - lower`
//! and `upper - v` with blindings `r` and `-r`. Their commitments are
//!
//! ```text
//! C_low  = C - lower*B
//! C_high = upper*B - C
//! ```
//!
//! so the verifier rebuilds both from `C` and the public bounds and learns
//! nothing about `v` beyond membership in the window.

use crate::{check_bounds, Blinding, RangeCommitment, RangeProof, RangeProofError, RangeProofScheme};
use bulletproofs::{BulletproofGens, PedersenGens, RangeProof as BpRangeProof};
use curve25519_dalek::{ristretto::CompressedRistretto, scalar::Scalar};
use merlin::Transcript;
use rand_core::CryptoRngCore;
use tracing::debug;

/// Bit width of each aggregated sub-proof.
const RANGE_BITS: usize = 64;

/// Number of aggregated values (`v - lower`, `upper - v`).
const PARTIES: usize = 2;

const TRANSCRIPT_LABEL: &[u8] = b"pcr-time-window-range-proof";

pub struct BulletproofsRangeProof {
    bp_gens: BulletproofGens,
    pc_gens: PedersenGens,
}

impl BulletproofsRangeProof {
    pub const BACKEND: &'static str = "bulletproofs";

    pub fn new() -> Self {
        Self {
            bp_gens: BulletproofGens::new(RANGE_BITS, PARTIES),
            pc_gens: PedersenGens::default(),
        }
    }

    fn transcript(lower: u64, upper: u64) -> Transcript {
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        transcript.append_u64(b"lower", lower);
        transcript.append_u64(b"upper", upper);
        transcript
    }
}

impl Default for BulletproofsRangeProof {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeProofScheme for BulletproofsRangeProof {
    fn backend(&self) -> &'static str {
        Self::BACKEND
    }

    fn prove(
        &self,
        value: u64,
        lower: u64,
        upper: u64,
        blinding: &Blinding,
        mut rng: &mut dyn CryptoRngCore,
    ) -> Result<(RangeCommitment, RangeProof), RangeProofError> {
        check_bounds(value, lower, upper)?;

        let r = *blinding.as_scalar();
        let commitment = self.pc_gens.commit(Scalar::from(value), r);

        let mut transcript = Self::transcript(lower, upper);
        let (proof, _) = BpRangeProof::prove_multiple_with_rng(
            &self.bp_gens,
            &self.pc_gens,
            &mut transcript,
            &[value - lower, upper - value],
            &[r, -r],
            RANGE_BITS,
            &mut rng,
        )
        .map_err(|e| RangeProofError::Proving(format!("{e:?}")))?;

        Ok((
            RangeCommitment(commitment.compress().to_bytes()),
            RangeProof(proof.to_bytes()),
        ))
    }

    fn verify(
        &self,
        lower: u64,
        upper: u64,
        commitment: &RangeCommitment,
        proof: &RangeProof,
    ) -> bool {
        if lower > upper {
            return false;
        }
        let Some(c) = CompressedRistretto(commitment.0).decompress() else {
            return false;
        };
        let Ok(proof) = BpRangeProof::from_bytes(&proof.0) else {
            debug!(len = proof.0.len(), "undecodable bulletproof");
            return false;
        };

        let b = self.pc_gens.B;
        let c_low = c - Scalar::from(lower) * b;
        let c_high = Scalar::from(upper) * b - c;

        let mut transcript = Self::transcript(lower, upper);
        match proof.verify_multiple(
            &self.bp_gens,
            &self.pc_gens,
            &mut transcript,
            &[c_low.compress(), c_high.compress()],
            RANGE_BITS,
        ) {
            Ok(()) => true,
            Err(err) => {
                debug!(lower, upper, ?err, "bulletproof rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    const LOWER: u64 = 1_700_000_000;
    const UPPER: u64 = 1_700_003_600;

    fn prove(value: u64, seed: u64) -> (RangeCommitment, RangeProof) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let scheme = BulletproofsRangeProof::new();
        let blinding = Blinding::from_random(&mut rng);
        scheme.prove(value, LOWER, UPPER, &blinding, &mut rng).unwrap()
    }

    #[test]
    fn in_window_value_verifies() {
        let scheme = BulletproofsRangeProof::new();
        let (c, p) = prove(LOWER + 1200, 1);
        assert!(scheme.verify(LOWER, UPPER, &c, &p));
    }

    #[test]
    fn window_edges_verify() {
        let scheme = BulletproofsRangeProof::new();
        let (c, p) = prove(LOWER, 2);
        assert!(scheme.verify(LOWER, UPPER, &c, &p));
        let (c, p) = prove(UPPER, 3);
        assert!(scheme.verify(LOWER, UPPER, &c, &p));
    }

    #[test]
    fn out_of_window_value_cannot_be_proven() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let scheme = BulletproofsRangeProof::new();
        let blinding = Blinding::from_random(&mut rng);
        assert_eq!(
            scheme.prove(UPPER + 1, LOWER, UPPER, &blinding, &mut rng).unwrap_err(),
            RangeProofError::ValueOutOfRange
        );
        assert_eq!(
            scheme.prove(LOWER, UPPER, LOWER, &blinding, &mut rng).unwrap_err(),
            RangeProofError::InvalidRange {
                lower: UPPER,
                upper: LOWER
            }
        );
    }

    #[test]
    fn tampered_commitment_is_rejected() {
        let scheme = BulletproofsRangeProof::new();
        let (_, p) = prove(LOWER + 10, 5);
        let (other, _) = prove(LOWER + 10, 6);
        assert!(!scheme.verify(LOWER, UPPER, &other, &p));
    }

    #[test]
    fn shifted_bounds_are_rejected() {
        let scheme = BulletproofsRangeProof::new();
        let (c, p) = prove(LOWER + 10, 7);
        assert!(!scheme.verify(LOWER + 1, UPPER, &c, &p));
        assert!(!scheme.verify(LOWER, UPPER + 1, &c, &p));
        assert!(!scheme.verify(UPPER, LOWER, &c, &p));
    }

    #[test]
    fn garbage_never_panics() {
        let scheme = BulletproofsRangeProof::new();
        assert!(!scheme.verify(
            LOWER,
            UPPER,
            &RangeCommitment([0xFF; 32]),
            &RangeProof(vec![1, 2, 3])
        ));
        let (c, _) = prove(LOWER, 8);
        assert!(!scheme.verify(LOWER, UPPER, &c, &RangeProof(vec![0; 672])));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(4))]

        #[test]
        fn proof_bit_flip_is_rejected(offset in 0u64..=3600, seed in any::<u64>(), bit in 0usize..8, pos in any::<prop::sample::Index>()) {
            let scheme = BulletproofsRangeProof::new();
            let (c, mut p) = prove(LOWER + offset, seed);
            let i = pos.index(p.0.len());
            p.0[i] ^= 1 << bit;
            prop_assert!(!scheme.verify(LOWER, UPPER, &c, &p));
        }
    }
}

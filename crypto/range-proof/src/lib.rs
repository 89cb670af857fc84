// Copyright (c) 2018-2025 The Botho Foundation

//! Range proofs over committed values.
//!
//! A vehicle commits to its report timestamp and proves it lies inside the
//! task's authorized window `[lower, upper]` without revealing it. The
//! verifier only ever sees the bounds, the commitment and the proof.

mod bulletproofs_backend;
mod error;
#[cfg(feature = "transparent-backend")]
mod transparent;

pub use crate::{bulletproofs_backend::BulletproofsRangeProof, error::RangeProofError};
#[cfg(feature = "transparent-backend")]
pub use crate::transparent::TransparentRangeProof;

use core::fmt;
use curve25519_dalek::scalar::Scalar;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Commitment to a hidden value, hex encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeCommitment(#[serde(with = "hex")] pub [u8; 32]);

impl RangeCommitment {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for RangeCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeCommitment({})", hex::encode(self.0))
    }
}

/// Backend-specific proof bytes, hex encoded on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeProof(#[serde(with = "hex")] pub Vec<u8>);

impl RangeProof {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RangeProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeProof({} bytes)", self.0.len())
    }
}

/// Commitment blinding factor. Known only to the prover.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Blinding(Scalar);

impl Blinding {
    pub fn from_random(rng: &mut dyn CryptoRngCore) -> Self {
        Self(Scalar::random(rng))
    }

    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }
}

impl From<Scalar> for Blinding {
    fn from(scalar: Scalar) -> Self {
        Self(scalar)
    }
}

impl fmt::Debug for Blinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Blinding(<redacted>)")
    }
}

/// A range proof system over a single committed `u64`.
///
/// `prove` fails with [`RangeProofError::InvalidRange`] when
/// `lower > upper` and with [`RangeProofError::ValueOutOfRange`] when the
/// value lies outside `[lower, upper]`. `verify` never panics and answers
/// `false` for malformed input.
pub trait RangeProofScheme: Send + Sync {
    /// Stable backend name.
    fn backend(&self) -> &'static str;

    fn prove(
        &self,
        value: u64,
        lower: u64,
        upper: u64,
        blinding: &Blinding,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<(RangeCommitment, RangeProof), RangeProofError>;

    fn verify(
        &self,
        lower: u64,
        upper: u64,
        commitment: &RangeCommitment,
        proof: &RangeProof,
    ) -> bool;
}

pub(crate) fn check_bounds(value: u64, lower: u64, upper: u64) -> Result<(), RangeProofError> {
    if lower > upper {
        return Err(RangeProofError::InvalidRange { lower, upper });
    }
    if value < lower || value > upper {
        return Err(RangeProofError::ValueOutOfRange);
    }
    Ok(())
}

/// Selects a range proof backend by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeProofKind {
    #[default]
    Bulletproofs,
    Transparent,
}

impl RangeProofKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulletproofs => BulletproofsRangeProof::BACKEND,
            Self::Transparent => "transparent",
        }
    }

    /// Instantiate the backend. A backend compiled out of this build is an
    /// error; there is no fallback to another backend.
    pub fn build(self) -> Result<Arc<dyn RangeProofScheme>, RangeProofError> {
        match self {
            Self::Bulletproofs => Ok(Arc::new(BulletproofsRangeProof::new())),
            #[cfg(feature = "transparent-backend")]
            Self::Transparent => Ok(Arc::new(TransparentRangeProof)),
            #[cfg(not(feature = "transparent-backend"))]
            Self::Transparent => Err(RangeProofError::BackendUnavailable(
                self.as_str().to_owned(),
            )),
        }
    }
}

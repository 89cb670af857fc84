// Copyright (c) 2018-2025 The Botho Foundation

//! Key material for proof-carrying reports: Ristretto signing keys, fixed
//! width secrets and the hash-to-point map used by key images.

pub mod domain_separators;

mod error;
mod ristretto;
mod secret;

pub use crate::{
    error::KeyError,
    ristretto::{RistrettoPrivate, RistrettoPublic},
    secret::SecretBytes,
};
pub use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};

use blake2::{Blake2b512, Digest};
use domain_separators::HASH_TO_POINT_DOMAIN_TAG;

/// Hashes a public key to a Ristretto point with no known discrete log
/// relation to the base point.
pub fn hash_to_point(public_key: &RistrettoPublic) -> RistrettoPoint {
    let mut hasher = Blake2b512::new();
    hasher.update(HASH_TO_POINT_DOMAIN_TAG);
    hasher.update(public_key.as_bytes());
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    RistrettoPoint::from_uniform_bytes(&wide)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn hash_to_point_is_deterministic_and_key_dependent() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let a = RistrettoPrivate::from_random(&mut rng).public_key();
        let b = RistrettoPrivate::from_random(&mut rng).public_key();
        assert_eq!(hash_to_point(&a), hash_to_point(&a));
        assert_ne!(hash_to_point(&a), hash_to_point(&b));
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! LSAG (Linkable Spontaneous Anonymous Group) signatures.
//!
//! A single-key ring signature over Ristretto. Each signature carries the key
//! image `I = x * Hp(P)` of the real signer, so two signatures by the same key
//! are linkable while the signer stays hidden among the ring members.
//!
//! Reference: "Linkable Spontaneous Anonymous Group Signature for Ad Hoc
//! Groups", Liu, Wei and Wong, ACISP 2004.

use blake2::{Blake2b512, Digest};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint, scalar::Scalar,
    traits::IsIdentity,
};
use rand_core::CryptoRngCore;

use pcr_core_types::append_length_prefixed;
use pcr_crypto_keys::{hash_to_point, RistrettoPrivate, RistrettoPublic};

use crate::{
    domain_separators::{LSAG_RING_DIGEST_DOMAIN_TAG, LSAG_ROUND_HASH_DOMAIN_TAG},
    ring_signature::{Error, KeyImage},
};

/// LSAG signature for a ring of public keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lsag {
    /// The initial challenge `c[0]`.
    pub c_zero: Scalar,

    /// Responses `s[0], s[1], ..., s[ring_size-1]`.
    pub responses: Vec<Scalar>,

    /// Key image of the signing key.
    pub key_image: KeyImage,
}

impl Lsag {
    /// Sign `message` under `context` as the member at `real_index`.
    ///
    /// # Arguments
    /// * `message` - Message to be signed.
    /// * `context` - Application context bound into every round.
    /// * `ring` - Public keys of the ring members, in ring order.
    /// * `real_index` - The index in the ring of the real signer.
    /// * `private_key` - The real signer's private key.
    /// * `rng` - Cryptographic RNG.
    pub fn sign(
        message: &[u8],
        context: &[u8],
        ring: &[RistrettoPublic],
        real_index: usize,
        private_key: &RistrettoPrivate,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<Self, Error> {
        let ring_size = ring.len();

        if ring_size == 0 {
            return Err(Error::EmptyRing);
        }

        if real_index >= ring_size {
            return Err(Error::IndexOutOfBounds);
        }

        let real_pubkey = &ring[real_index];
        if *real_pubkey != private_key.public_key() {
            return Err(Error::SignerNotInRing);
        }

        let G = RISTRETTO_BASEPOINT_POINT;
        let x: Scalar = *private_key.as_ref();

        // Compute key image: I = x * Hp(P)
        let key_image = KeyImage::from(private_key);
        let I = key_image
            .compressed()
            .decompress()
            .ok_or(Error::InvalidKeyImage)?;

        let ring_digest = compute_ring_digest(ring);

        let mut responses: Vec<Scalar> = vec![Scalar::ZERO; ring_size];
        for (i, response) in responses.iter_mut().enumerate() {
            if i != real_index {
                *response = Scalar::random(rng);
            }
        }

        // Random nonce for the real signer
        let alpha = Scalar::random(rng);

        // L = alpha * G
        // R = alpha * Hp(P_real)
        let L_init = alpha * G;
        let R_init = alpha * hash_to_point(real_pubkey);

        let mut challenges: Vec<Scalar> = vec![Scalar::ZERO; ring_size];
        challenges[(real_index + 1) % ring_size] =
            compute_round_hash(message, context, &ring_digest, &key_image, &L_init, &R_init);

        // Go around the ring from real_index + 1 back to real_index
        for n in 1..ring_size {
            let i = (real_index + n) % ring_size;
            let next_i = (i + 1) % ring_size;

            let P_i = &ring[i];
            let c_i = challenges[i];
            let s_i = responses[i];

            // L = s * G + c * P
            let L_i = s_i * G + c_i * P_i.as_ref();

            // R = s * Hp(P) + c * I
            let R_i = s_i * hash_to_point(P_i) + c_i * I;

            challenges[next_i] =
                compute_round_hash(message, context, &ring_digest, &key_image, &L_i, &R_i);
        }

        // Close the loop: s = alpha - c * x
        responses[real_index] = alpha - challenges[real_index] * x;

        Ok(Lsag {
            c_zero: challenges[0],
            responses,
            key_image,
        })
    }

    /// Verify an LSAG signature.
    pub fn verify(
        &self,
        message: &[u8],
        context: &[u8],
        ring: &[RistrettoPublic],
    ) -> Result<(), Error> {
        let ring_size = ring.len();

        if ring_size == 0 {
            return Err(Error::EmptyRing);
        }

        if self.responses.len() != ring_size {
            return Err(Error::LengthMismatch(self.responses.len(), ring_size));
        }

        let G = RISTRETTO_BASEPOINT_POINT;

        let I = self
            .key_image
            .compressed()
            .decompress()
            .ok_or(Error::InvalidKeyImage)?;
        if I.is_identity() {
            return Err(Error::InvalidKeyImage);
        }

        let ring_digest = compute_ring_digest(ring);

        let mut c = self.c_zero;
        for (P_i, s_i) in ring.iter().zip(&self.responses) {
            let L_i = s_i * G + c * P_i.as_ref();
            let R_i = s_i * hash_to_point(P_i) + c * I;
            c = compute_round_hash(message, context, &ring_digest, &self.key_image, &L_i, &R_i);
        }

        // Check that we closed the loop
        if c == self.c_zero {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }

    /// Encoded length for a ring of `ring_size` members.
    pub fn encoded_len(ring_size: usize) -> usize {
        32 * (2 + ring_size)
    }

    /// `c_zero || key_image || responses`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::encoded_len(self.responses.len()));
        bytes.extend_from_slice(self.c_zero.as_bytes());
        bytes.extend_from_slice(self.key_image.as_bytes());
        for s in &self.responses {
            bytes.extend_from_slice(s.as_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::encoded_len(1) || bytes.len() % 32 != 0 {
            return Err(Error::LengthMismatch(bytes.len(), Self::encoded_len(1)));
        }

        let mut chunks = bytes.chunks_exact(32);
        let next_scalar = |chunk: Option<&[u8]>| -> Result<Scalar, Error> {
            let chunk: [u8; 32] = chunk
                .and_then(|c| c.try_into().ok())
                .ok_or(Error::LengthMismatch(bytes.len(), Self::encoded_len(1)))?;
            Option::<Scalar>::from(Scalar::from_canonical_bytes(chunk)).ok_or(Error::InvalidScalar)
        };

        let c_zero = next_scalar(chunks.next())?;
        let key_image = KeyImage::try_from(chunks.next().unwrap_or_default())?;
        let mut responses = Vec::with_capacity(bytes.len() / 32 - 2);
        for chunk in chunks {
            responses.push(next_scalar(Some(chunk))?);
        }

        Ok(Lsag {
            c_zero,
            responses,
            key_image,
        })
    }
}

/// Digest of the ring members, bound into every round so that a signature
/// cannot be replayed against a reordered or different ring.
fn compute_ring_digest(ring: &[RistrettoPublic]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(LSAG_RING_DIGEST_DOMAIN_TAG);
    hasher.update((ring.len() as u64).to_le_bytes());
    for member in ring {
        hasher.update(member.as_bytes());
    }
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Compute the round hash for challenge derivation.
fn compute_round_hash(
    message: &[u8],
    context: &[u8],
    ring_digest: &[u8; 64],
    key_image: &KeyImage,
    L: &RistrettoPoint,
    R: &RistrettoPoint,
) -> Scalar {
    let mut prefixed = Vec::with_capacity(16 + message.len() + context.len());
    append_length_prefixed(&mut prefixed, message);
    append_length_prefixed(&mut prefixed, context);

    let mut hasher = Blake2b512::new();
    hasher.update(LSAG_ROUND_HASH_DOMAIN_TAG);
    hasher.update(&prefixed);
    hasher.update(ring_digest);
    hasher.update(key_image.as_bytes());
    hasher.update(L.compress().as_bytes());
    hasher.update(R.compress().as_bytes());
    Scalar::from_hash(hasher)
}

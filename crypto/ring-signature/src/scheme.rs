// Copyright (c) 2018-2025 The Botho Foundation

//! The linkable ring signature scheme used to sign reports.

use crate::{
    domain_separators::LSAG_MESSAGE_DOMAIN_TAG, Error, LinkTag, Lsag, PublicKeyRing, RingId,
};
use pcr_core_types::{append_length_prefixed, TaskId};
use pcr_crypto_keys::RistrettoPrivate;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A ring signature over a report, as carried on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingSignature {
    pub ring_id: RingId,
    pub task_id: TaskId,
    /// Backend-specific signature bytes.
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
    pub link_tag: LinkTag,
    /// Signing context. Hashed into every round of the signature.
    #[serde(with = "hex")]
    pub context: Vec<u8>,
    pub ring_size: u64,
    pub backend: String,
}

/// A linkable ring signature scheme.
///
/// Implementations are stateless. `verify` never panics and answers `false`
/// for anything it cannot check, including a signature produced by another
/// backend or for another ring.
pub trait LinkableRingScheme: Send + Sync {
    /// Backend tag written into every signature.
    fn backend(&self) -> &'static str;

    fn sign(
        &self,
        message: &[u8],
        ring: &PublicKeyRing,
        signer_index: usize,
        signer: &RistrettoPrivate,
        context: &[u8],
        rng: &mut dyn CryptoRngCore,
    ) -> Result<RingSignature, Error>;

    fn verify(&self, message: &[u8], signature: &RingSignature, ring: &PublicKeyRing) -> bool;
}

/// LSAG over Ristretto.
#[derive(Clone, Copy, Debug, Default)]
pub struct LsagScheme;

impl LsagScheme {
    pub const BACKEND: &'static str = "lsag-ristretto-v1";

    /// The message handed to the LSAG primitive binds the task and ring ids
    /// in front of the caller's message.
    fn bound_message(task_id: &TaskId, ring_id: &RingId, message: &[u8]) -> Vec<u8> {
        let mut bound = Vec::with_capacity(LSAG_MESSAGE_DOMAIN_TAG.len() + 48 + message.len());
        bound.extend_from_slice(LSAG_MESSAGE_DOMAIN_TAG);
        append_length_prefixed(&mut bound, task_id.as_bytes());
        bound.extend_from_slice(ring_id.as_bytes());
        append_length_prefixed(&mut bound, message);
        bound
    }
}

impl LinkableRingScheme for LsagScheme {
    fn backend(&self) -> &'static str {
        Self::BACKEND
    }

    fn sign(
        &self,
        message: &[u8],
        ring: &PublicKeyRing,
        signer_index: usize,
        signer: &RistrettoPrivate,
        context: &[u8],
        rng: &mut dyn CryptoRngCore,
    ) -> Result<RingSignature, Error> {
        if signer_index >= ring.len() {
            return Err(Error::IndexOutOfBounds);
        }
        let bound = Self::bound_message(ring.task_id(), ring.ring_id(), message);
        let lsag = Lsag::sign(&bound, context, ring.members(), signer_index, signer, rng)?;

        Ok(RingSignature {
            ring_id: *ring.ring_id(),
            task_id: ring.task_id().clone(),
            link_tag: LinkTag::derive(&lsag.key_image, ring.task_id()),
            signature: lsag.to_bytes(),
            context: context.to_vec(),
            ring_size: ring.len() as u64,
            backend: Self::BACKEND.to_owned(),
        })
    }

    fn verify(&self, message: &[u8], signature: &RingSignature, ring: &PublicKeyRing) -> bool {
        if signature.backend != Self::BACKEND {
            debug!(backend = %signature.backend, "unexpected ring signature backend");
            return false;
        }
        if signature.ring_id != *ring.ring_id()
            || signature.task_id != *ring.task_id()
            || signature.ring_size != ring.len() as u64
        {
            debug!("ring signature does not refer to the supplied ring");
            return false;
        }

        let Ok(lsag) = Lsag::from_bytes(&signature.signature) else {
            return false;
        };
        let bound = Self::bound_message(ring.task_id(), ring.ring_id(), message);
        if let Err(err) = lsag.verify(&bound, &signature.context, ring.members()) {
            debug!(%err, "lsag verification failed");
            return false;
        }

        LinkTag::derive(&lsag.key_image, &signature.task_id) == signature.link_tag
    }
}

/// Selects a ring signature backend by its tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingSignatureKind {
    #[default]
    #[serde(rename = "lsag-ristretto-v1")]
    Lsag,
}

impl RingSignatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lsag => LsagScheme::BACKEND,
        }
    }

    pub fn build(self) -> Arc<dyn LinkableRingScheme> {
        match self {
            Self::Lsag => Arc::new(LsagScheme),
        }
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

use super::Error;
use crate::domain_separators::LINK_TAG_DOMAIN_TAG;
use core::{cmp::Ordering, fmt, hash::{Hash, Hasher}};
use curve25519_dalek::{ristretto::CompressedRistretto, scalar::Scalar};
use pcr_core_types::{append_length_prefixed, TaskId};
use pcr_crypto_keys::{hash_to_point, RistrettoPrivate, RistrettoPublic};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The "image" of a private key `x`: I = x * Hp(x * G) = x * Hp(P).
///
/// Two signatures by the same key carry the same image, whatever the message.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
pub struct KeyImage {
    /// The curve point corresponding to the key image
    #[serde(with = "hex")]
    point: [u8; 32],
}

impl KeyImage {
    /// View the compressed point as an array of bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.point
    }

    pub fn compressed(&self) -> CompressedRistretto {
        CompressedRistretto(self.point)
    }
}

impl From<&RistrettoPrivate> for KeyImage {
    fn from(x: &RistrettoPrivate) -> Self {
        let P = RistrettoPublic::from(x);
        let Hp = hash_to_point(&P);
        let point = x.as_ref() * Hp;
        KeyImage {
            point: point.compress().to_bytes(),
        }
    }
}

// Many tests use this
impl From<u64> for KeyImage {
    fn from(n: u64) -> Self {
        let private_key = RistrettoPrivate::from(Scalar::from(n));
        Self::from(&private_key)
    }
}

impl TryFrom<[u8; 32]> for KeyImage {
    type Error = Error;
    fn try_from(src: [u8; 32]) -> Result<Self, Self::Error> {
        CompressedRistretto(src)
            .decompress()
            .ok_or(Error::InvalidKeyImage)?;
        Ok(Self { point: src })
    }
}

impl TryFrom<&[u8]> for KeyImage {
    type Error = Error;
    fn try_from(src: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; 32] = src
            .try_into()
            .map_err(|_| Error::LengthMismatch(src.len(), 32))?;
        Self::try_from(bytes)
    }
}

impl AsRef<[u8]> for KeyImage {
    fn as_ref(&self) -> &[u8] {
        &self.point[..]
    }
}

impl PartialEq for KeyImage {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
    }
}

impl Eq for KeyImage {}

impl Hash for KeyImage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.point.hash(state);
    }
}

impl PartialOrd for KeyImage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyImage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.point.cmp(&other.point)
    }
}

impl fmt::Debug for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyImage({})", hex::encode(self.point))
    }
}

/// Per-task pseudonym of a signer.
///
/// `SHA256("pcr_link_tag" || key_image || len(task_id) || task_id)`. Anyone
/// can recompute it from a valid signature; it is equal across one signer's
/// submissions within a task and unrelated across tasks because the task key
/// itself differs per task.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTag(#[serde(with = "hex")] [u8; 32]);

impl LinkTag {
    pub fn derive(key_image: &KeyImage, task_id: &TaskId) -> Self {
        let mut buf = Vec::with_capacity(32 + 8 + task_id.as_bytes().len());
        buf.extend_from_slice(key_image.as_bytes());
        append_length_prefixed(&mut buf, task_id.as_bytes());

        let mut hasher = Sha256::new();
        hasher.update(LINK_TAG_DOMAIN_TAG);
        hasher.update(&buf);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<[u8; 32]> for LinkTag {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for LinkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkTag({})", self.to_hex())
    }
}

impl fmt::Display for LinkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

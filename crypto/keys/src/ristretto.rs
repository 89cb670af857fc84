// Copyright (c) 2018-2025 The Botho Foundation

//! Ristretto private and public keys.

use crate::KeyError;
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_TABLE,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand_core::CryptoRngCore;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A Ristretto scalar used as a signing key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RistrettoPrivate(Scalar);

impl RistrettoPrivate {
    pub fn from_random(rng: &mut dyn CryptoRngCore) -> Self {
        Self(Scalar::random(rng))
    }

    /// Decode a canonical little-endian scalar.
    pub fn from_canonical_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
            .map(Self)
            .ok_or(KeyError::InvalidScalar)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn public_key(&self) -> RistrettoPublic {
        RistrettoPublic::from(self)
    }
}

impl From<Scalar> for RistrettoPrivate {
    fn from(scalar: Scalar) -> Self {
        Self(scalar)
    }
}

impl AsRef<Scalar> for RistrettoPrivate {
    fn as_ref(&self) -> &Scalar {
        &self.0
    }
}

impl fmt::Debug for RistrettoPrivate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RistrettoPrivate(<redacted>)")
    }
}

/// A Ristretto point `x * G` for some private scalar `x`.
///
/// Equality, ordering and hashing go through the compressed encoding. On the
/// wire a public key is its 32-byte compressed encoding in hex.
#[derive(Clone, Copy)]
pub struct RistrettoPublic {
    point: RistrettoPoint,
    compressed: CompressedRistretto,
}

impl RistrettoPublic {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.compressed.to_bytes()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.compressed.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    pub fn from_hex(src: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(src).map_err(|_| KeyError::InvalidHex)?;
        Self::try_from(&bytes[..])
    }
}

impl From<&RistrettoPrivate> for RistrettoPublic {
    fn from(private: &RistrettoPrivate) -> Self {
        RistrettoPublic::from(&private.0 * RISTRETTO_BASEPOINT_TABLE)
    }
}

impl From<RistrettoPoint> for RistrettoPublic {
    fn from(point: RistrettoPoint) -> Self {
        Self {
            point,
            compressed: point.compress(),
        }
    }
}

impl AsRef<RistrettoPoint> for RistrettoPublic {
    fn as_ref(&self) -> &RistrettoPoint {
        &self.point
    }
}

impl TryFrom<[u8; 32]> for RistrettoPublic {
    type Error = KeyError;

    fn try_from(src: [u8; 32]) -> Result<Self, KeyError> {
        let compressed = CompressedRistretto(src);
        let point = compressed.decompress().ok_or(KeyError::InvalidCurvePoint)?;
        Ok(Self { point, compressed })
    }
}

impl TryFrom<&[u8]> for RistrettoPublic {
    type Error = KeyError;

    fn try_from(src: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = src
            .try_into()
            .map_err(|_| KeyError::LengthMismatch(src.len(), 32))?;
        Self::try_from(bytes)
    }
}

impl PartialEq for RistrettoPublic {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed
    }
}

impl Eq for RistrettoPublic {}

impl Hash for RistrettoPublic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.compressed.as_bytes().hash(state);
    }
}

impl PartialOrd for RistrettoPublic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RistrettoPublic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compressed.as_bytes().cmp(other.compressed.as_bytes())
    }
}

impl fmt::Debug for RistrettoPublic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RistrettoPublic({})", self.to_hex())
    }
}

impl fmt::Display for RistrettoPublic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RistrettoPublic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RistrettoPublic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

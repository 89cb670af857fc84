// Copyright (c) 2018-2025 The Botho Foundation

//! Errors which can occur in connection to ring signatures and task rings

use displaydoc::Display;
use pcr_core_types::TaskId;

/// An error which can occur when building a ring or signing with it
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Incorrect length for signature bytes, provided `{0}`, required `{1}`.
    LengthMismatch(usize, usize),

    /// Index out of bounds
    IndexOutOfBounds,

    /// Invalid curve point
    InvalidCurvePoint,

    /// Invalid scalar encoding
    InvalidScalar,

    /// The signature was not able to be validated
    InvalidSignature,

    /// Failed to compress/decompress a KeyImage
    InvalidKeyImage,

    /// The signer's public key is not at the given ring position
    SignerNotInRing,

    /// A ring must have at least one member
    EmptyRing,

    /// Ring member `{0}` appears more than once
    DuplicateRingMember(usize),

    /// Ring id does not match the ring contents
    RingIdMismatch,

    /// A ring is already finalized for task `{0}`
    RingAlreadyFinalized(TaskId),
}

impl std::error::Error for Error {}

impl From<pcr_crypto_keys::KeyError> for Error {
    fn from(src: pcr_crypto_keys::KeyError) -> Self {
        match src {
            pcr_crypto_keys::KeyError::LengthMismatch(found, expected) => {
                Self::LengthMismatch(found, expected)
            }
            pcr_crypto_keys::KeyError::InvalidScalar => Self::InvalidScalar,
            _ => Self::InvalidCurvePoint,
        }
    }
}

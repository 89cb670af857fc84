// Copyright (c) 2018-2025 The Botho Foundation

//! Errors which can occur when decoding keys

use displaydoc::Display;

/// An error which can occur when decoding a key from bytes
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum KeyError {
    /// Incorrect length for key bytes, provided `{0}`, required `{1}`.
    LengthMismatch(usize, usize),

    /// The bytes are not a valid Ristretto point encoding
    InvalidCurvePoint,

    /// The bytes are not a canonical scalar encoding
    InvalidScalar,

    /// Hex decoding failed
    InvalidHex,
}

impl std::error::Error for KeyError {}

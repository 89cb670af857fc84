// Copyright (c) 2018-2025 The Botho Foundation

use thiserror::Error;

/// Errors from range proof construction and backend selection.
///
/// Verification never errors; it answers with a `bool`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeProofError {
    #[error("invalid range: lower bound {lower} exceeds upper bound {upper}")]
    InvalidRange { lower: u64, upper: u64 },

    #[error("value is outside the committed range")]
    ValueOutOfRange,

    #[error("range proof backend `{0}` is not available in this build")]
    BackendUnavailable(String),

    #[error("proving failed: {0}")]
    Proving(String),
}

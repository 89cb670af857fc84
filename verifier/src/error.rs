// Copyright (c) 2018-2025 The Botho Foundation

use pcr_core_types::TaskId;
use pcr_crypto_range_proof::RangeProofError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a report was rejected. Exactly one reason per rejection.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("ERR_TOKEN_EXPIRED")]
    #[serde(rename = "ERR_TOKEN_EXPIRED")]
    TokenExpired,

    #[error("ERR_TOKEN_REPLAY")]
    #[serde(rename = "ERR_TOKEN_REPLAY")]
    TokenReplay,

    #[error("ERR_MERKLE_PROOF_INVALID")]
    #[serde(rename = "ERR_MERKLE_PROOF_INVALID")]
    MerkleProofInvalid,

    #[error("ERR_RANGE_PROOF_INVALID")]
    #[serde(rename = "ERR_RANGE_PROOF_INVALID")]
    RangeProofInvalid,

    #[error("ERR_LRS_VERIFY_FAIL")]
    #[serde(rename = "ERR_LRS_VERIFY_FAIL")]
    RingSignatureInvalid,

    #[error("ERR_DUPLICATE_SUBMISSION")]
    #[serde(rename = "ERR_DUPLICATE_SUBMISSION")]
    DuplicateSubmission,

    #[error("ERR_SPEED_VIOLATION")]
    #[serde(rename = "ERR_SPEED_VIOLATION")]
    SpeedViolation,

    #[error("ERR_TIME_BACKWARD")]
    #[serde(rename = "ERR_TIME_BACKWARD")]
    TimeBackward,

    #[error("ERR_MALFORMED_REPORT")]
    #[serde(rename = "ERR_MALFORMED_REPORT")]
    MalformedReport,

    #[error("ERR_UNKNOWN_TASK")]
    #[serde(rename = "ERR_UNKNOWN_TASK")]
    UnknownTask,
}

impl RejectReason {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenExpired => "ERR_TOKEN_EXPIRED",
            Self::TokenReplay => "ERR_TOKEN_REPLAY",
            Self::MerkleProofInvalid => "ERR_MERKLE_PROOF_INVALID",
            Self::RangeProofInvalid => "ERR_RANGE_PROOF_INVALID",
            Self::RingSignatureInvalid => "ERR_LRS_VERIFY_FAIL",
            Self::DuplicateSubmission => "ERR_DUPLICATE_SUBMISSION",
            Self::SpeedViolation => "ERR_SPEED_VIOLATION",
            Self::TimeBackward => "ERR_TIME_BACKWARD",
            Self::MalformedReport => "ERR_MALFORMED_REPORT",
            Self::UnknownTask => "ERR_UNKNOWN_TASK",
        }
    }
}

/// Errors setting up a verifier or its task table.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("range proof backend: {0}")]
    RangeProof(#[from] RangeProofError),

    #[error("task {0} already has a policy")]
    TaskAlreadyRegistered(TaskId),

    #[error("task {task_id} has an empty time window [{lower}, {upper}]")]
    InvalidWindow { task_id: TaskId, lower: u64, upper: u64 },
}

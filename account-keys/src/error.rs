// Copyright (c) 2018-2025 The Botho Foundation

use thiserror::Error;

/// The audit store could not take a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditSinkError {
    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("key derivation failed")]
    Kdf,

    #[error("audit record was not stored, no task key issued: {0}")]
    AuditSink(#[from] AuditSinkError),

    #[error("ring construction failed: {0}")]
    Ring(#[from] pcr_crypto_ring_signature::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

// Copyright (c) 2018-2025 The Botho Foundation

use pcr_account_keys::AuditSinkError;
use pcr_core_types::TaskId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("invalid audit authority key")]
    PermissionDenied,

    #[error("no audit record for the given link tag in task {0}")]
    NotFound(TaskId),

    #[error(transparent)]
    Store(#[from] AuditSinkError),
}

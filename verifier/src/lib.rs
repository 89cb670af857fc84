// Copyright (c) 2018-2025 The Botho Foundation

#![deny(unsafe_code)]

//! Verification of proof-carrying crowdsensing reports.
//!
//! A report proves that its cell is on the task whitelist and that its
//! timestamp lies in the task window, and carries a linkable ring signature
//! by one of the task's enrolled vehicles. [`ReportVerifier`] checks all of
//! it, spends the report's RSU token and records its link tag so that a
//! vehicle can report once per task.

pub mod assembler;
pub mod config;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod policy;
pub mod report;
pub mod telemetry;
pub mod token;
mod verifier;

pub use crate::{
    assembler::{AssemblyError, ReportAssembler, ReportDraft},
    config::{SpeedCheckConfig, TelemetryConfig, VerifierConfig},
    error::{RejectReason, VerifierError},
    ledger::{
        DuplicateCheck, DuplicateLedger, InMemoryDuplicateLedger, InMemoryNonceStore,
        LedgerError, NonceStore, SubmissionMetadata,
    },
    policy::TaskPolicy,
    report::{GeoProof, ProofCarryingReport, ReportError, TimeProof, REPORT_VERSION},
    token::{RsuToken, TOKEN_VERSION},
    verifier::{ReportVerifier, VerificationOutcome, VerificationState},
};

// Copyright (c) 2018-2025 The Botho Foundation

//! Report verification.
//!
//! ```text
//! RECEIVED ─► TOKEN_CHECKED ─► GEO_CHECKED ─► TIME_CHECKED ─► SIG_CHECKED ─► DEDUP_CHECKED ─► ACCEPTED
//!    │              │               │               │               │               │
//!    └──────────────┴───────────────┴──── REJECTED(reason) ─────────┴───────────────┘
//! ```
//!
//! A report moves forward only when the current step passes. The first
//! failing step decides the single reason code. Ledger or nonce store
//! failures end in [`VerificationOutcome::Indeterminate`] instead, since
//! nothing is known about the report's validity.

use crate::{
    config::VerifierConfig,
    error::{RejectReason, VerifierError},
    geo,
    ledger::{
        DuplicateLedger, InMemoryDuplicateLedger, InMemoryNonceStore, NonceStore,
        SubmissionMetadata,
    },
    policy::TaskPolicy,
    report::{ProofCarryingReport, REPORT_VERSION},
    token::TOKEN_VERSION,
};
use parking_lot::RwLock;
use pcr_core_types::{TaskId, UnixTimestamp};
use pcr_crypto_merkle::MerkleWhitelist;
use pcr_crypto_range_proof::RangeProofScheme;
use pcr_crypto_ring_signature::{LinkTag, LinkableRingScheme, PublicKeyRing, RingRegistry};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, info, warn};

/// The last state a report reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationState {
    Received,
    TokenChecked,
    GeoChecked,
    TimeChecked,
    SigChecked,
    DedupChecked,
    Accepted,
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "RECEIVED",
            Self::TokenChecked => "TOKEN_CHECKED",
            Self::GeoChecked => "GEO_CHECKED",
            Self::TimeChecked => "TIME_CHECKED",
            Self::SigChecked => "SIG_CHECKED",
            Self::DedupChecked => "DEDUP_CHECKED",
            Self::Accepted => "ACCEPTED",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Accepted {
        link_tag: LinkTag,
    },
    /// `state` is the last state passed before the failing step.
    Rejected {
        state: VerificationState,
        reason: RejectReason,
    },
    /// An infrastructure fault stopped verification after `state`.
    Indeterminate {
        state: VerificationState,
        detail: String,
    },
}

impl VerificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// `"OK"`, the rejection code, or `"INDETERMINATE"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "OK",
            Self::Rejected { reason, .. } => reason.code(),
            Self::Indeterminate { .. } => "INDETERMINATE",
        }
    }
}

/// Verifies proof-carrying reports against registered task policies and
/// finalized task rings.
///
/// Safe to share across worker threads; each call verifies one report.
pub struct ReportVerifier {
    config: VerifierConfig,
    range_proofs: Arc<dyn RangeProofScheme>,
    ring_scheme: Arc<dyn LinkableRingScheme>,
    rings: Arc<RingRegistry>,
    policies: RwLock<HashMap<TaskId, Arc<TaskPolicy>>>,
    ledger: Arc<dyn DuplicateLedger>,
    nonces: Arc<dyn NonceStore>,
}

impl ReportVerifier {
    /// A verifier with in-memory ledger and nonce store. Spent nonces are
    /// evicted after `nonce_retention_s` unless expired tokens are allowed.
    pub fn new(config: VerifierConfig, rings: Arc<RingRegistry>) -> Result<Self, VerifierError> {
        let nonces = if config.allow_expired_tokens {
            InMemoryNonceStore::new()
        } else {
            InMemoryNonceStore::with_retention(config.nonce_retention_s)
        };
        Self::with_stores(
            config,
            rings,
            Arc::new(InMemoryDuplicateLedger::new()),
            Arc::new(nonces),
        )
    }

    pub fn with_stores(
        config: VerifierConfig,
        rings: Arc<RingRegistry>,
        ledger: Arc<dyn DuplicateLedger>,
        nonces: Arc<dyn NonceStore>,
    ) -> Result<Self, VerifierError> {
        let range_proofs = config.range_proof_backend.build()?;
        let ring_scheme = config.ring_signature_backend.build();
        info!(
            range_proof_backend = range_proofs.backend(),
            ring_signature_backend = ring_scheme.backend(),
            allow_expired_tokens = config.allow_expired_tokens,
            "report verifier ready"
        );

        Ok(Self {
            config,
            range_proofs,
            ring_scheme,
            rings,
            policies: RwLock::new(HashMap::new()),
            ledger,
            nonces,
        })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Authorize a task. A task's policy can be set once.
    pub fn register_task(&self, policy: TaskPolicy) -> Result<(), VerifierError> {
        if policy.window_lower > policy.window_upper {
            return Err(VerifierError::InvalidWindow {
                task_id: policy.task_id,
                lower: policy.window_lower,
                upper: policy.window_upper,
            });
        }

        let mut policies = self.policies.write();
        if policies.contains_key(&policy.task_id) {
            return Err(VerifierError::TaskAlreadyRegistered(policy.task_id));
        }
        info!(
            task_id = %policy.task_id,
            window_lower = policy.window_lower,
            window_upper = policy.window_upper,
            "registered task policy"
        );
        policies.insert(policy.task_id.clone(), Arc::new(policy));
        Ok(())
    }

    pub fn policy(&self, task_id: &TaskId) -> Option<Arc<TaskPolicy>> {
        self.policies.read().get(task_id).cloned()
    }

    /// Decode a wire-form report and verify it.
    pub fn verify_bytes(&self, bytes: &[u8], now: UnixTimestamp) -> VerificationOutcome {
        match ProofCarryingReport::from_json(bytes) {
            Ok(report) => self.verify(&report, now),
            Err(err) => {
                warn!(%err, "undecodable report");
                VerificationOutcome::Rejected {
                    state: VerificationState::Received,
                    reason: RejectReason::MalformedReport,
                }
            }
        }
    }

    pub fn verify(&self, report: &ProofCarryingReport, now: UnixTimestamp) -> VerificationOutcome {
        self.verify_with_previous(report, None, now)
    }

    /// Verify `report`; when `previous` is the same vehicle's last accepted
    /// report and the speed check is enabled, also check that the vehicle
    /// could plausibly have travelled between the two cells.
    pub fn verify_with_previous(
        &self,
        report: &ProofCarryingReport,
        previous: Option<&ProofCarryingReport>,
        now: UnixTimestamp,
    ) -> VerificationOutcome {
        let task_id = &report.task_id;
        let outcome = self.run(report, previous, now);
        match &outcome {
            VerificationOutcome::Accepted { link_tag } => {
                info!(%task_id, link_tag = %link_tag.short(), "report accepted");
            }
            VerificationOutcome::Rejected { state, reason } => {
                warn!(%task_id, %state, code = reason.code(), "report rejected");
            }
            VerificationOutcome::Indeterminate { state, detail } => {
                warn!(%task_id, %state, %detail, "report verification indeterminate");
            }
        }
        outcome
    }

    fn run(
        &self,
        report: &ProofCarryingReport,
        previous: Option<&ProofCarryingReport>,
        now: UnixTimestamp,
    ) -> VerificationOutcome {
        use VerificationState::*;

        let reject = |state, reason| VerificationOutcome::Rejected { state, reason };
        let task_id = &report.task_id;

        // Intake.
        if report.version != REPORT_VERSION
            || report.token.version != TOKEN_VERSION
            || report.signature.task_id != *task_id
        {
            return reject(Received, RejectReason::MalformedReport);
        }
        let Some(policy) = self.policy(task_id) else {
            return reject(Received, RejectReason::UnknownTask);
        };
        let Some(ring) = self.rings.get(task_id) else {
            return reject(Received, RejectReason::UnknownTask);
        };
        if report.signature.ring_size != ring.len() as u64 {
            return reject(Received, RejectReason::MalformedReport);
        }
        debug!(%task_id, state = %Received, "report received");

        // Token freshness and single use.
        if !self.config.allow_expired_tokens && report.token.is_expired(now) {
            return reject(Received, RejectReason::TokenExpired);
        }
        let (window_id, nonce) = report.token.replay_key();
        match self
            .nonces
            .insert_if_absent(window_id, nonce, report.token.expiry_ts, now)
        {
            Ok(true) => {}
            Ok(false) => return reject(Received, RejectReason::TokenReplay),
            Err(err) => {
                return VerificationOutcome::Indeterminate {
                    state: Received,
                    detail: err.to_string(),
                }
            }
        }
        debug!(%task_id, state = %TokenChecked, window_id, "token checked");

        if !self.check_geo(report, &policy) {
            return reject(TokenChecked, RejectReason::MerkleProofInvalid);
        }
        debug!(%task_id, state = %GeoChecked, "whitelist membership checked");

        // The signed timestamp feeds the speed check, so it must sit in the
        // same window the commitment is proven against.
        if !policy.covers(report.timestamp) {
            debug!(%task_id, timestamp = report.timestamp, "signed timestamp outside task window");
            return reject(GeoChecked, RejectReason::RangeProofInvalid);
        }
        if !self.range_proofs.verify(
            policy.window_lower,
            policy.window_upper,
            &report.time_proof.commitment,
            &report.time_proof.proof,
        ) {
            return reject(GeoChecked, RejectReason::RangeProofInvalid);
        }
        debug!(%task_id, state = %TimeChecked, "time window checked");

        if !self.check_signature(report, &policy, &ring) {
            return reject(TimeChecked, RejectReason::RingSignatureInvalid);
        }
        let link_tag = report.signature.link_tag;
        debug!(%task_id, state = %SigChecked, link_tag = %link_tag.short(), "ring signature checked");

        // A report rejected for speed must not take the vehicle's slot for
        // the task, so the speed verdict is settled before the ledger write.
        let speed = match previous.filter(|_| self.config.speed_check.enabled) {
            Some(previous) => self.check_speed(report, previous),
            None => Ok(()),
        };
        if let Err(reason) = speed {
            return match self.ledger.contains(task_id, &link_tag) {
                Ok(true) => reject(SigChecked, RejectReason::DuplicateSubmission),
                Ok(false) => reject(DedupChecked, reason),
                Err(err) => VerificationOutcome::Indeterminate {
                    state: SigChecked,
                    detail: err.to_string(),
                },
            };
        }

        let metadata = SubmissionMetadata {
            ring_id: *ring.ring_id(),
            received_at: now,
            report_digest: report.digest(),
        };
        match self.ledger.record(task_id, &link_tag, metadata) {
            Ok(check) if check.is_duplicate => {
                debug!(%task_id, previous = check.previous.len(), "duplicate submission");
                return reject(SigChecked, RejectReason::DuplicateSubmission);
            }
            Ok(_) => {}
            Err(err) => {
                return VerificationOutcome::Indeterminate {
                    state: SigChecked,
                    detail: err.to_string(),
                }
            }
        }
        debug!(%task_id, state = %DedupChecked, "duplicate check passed");

        VerificationOutcome::Accepted { link_tag }
    }

    fn check_geo(&self, report: &ProofCarryingReport, policy: &TaskPolicy) -> bool {
        let geo_proof = &report.geo_proof;
        if geo_proof.root != policy.whitelist_root {
            debug!(task_id = %report.task_id, "report whitelist root is not the task's");
            return false;
        }
        MerkleWhitelist::verify(
            report.cell_id.as_bytes(),
            &geo_proof.merkle_proof(),
            &policy.whitelist_root,
            geo_proof.index,
        )
    }

    fn check_signature(
        &self,
        report: &ProofCarryingReport,
        policy: &TaskPolicy,
        ring: &PublicKeyRing,
    ) -> bool {
        if report.signature.context != policy.context {
            debug!(task_id = %report.task_id, "signing context is not the task's");
            return false;
        }
        self.ring_scheme
            .verify(&report.canonical_message(), &report.signature, ring)
    }

    fn check_speed(
        &self,
        report: &ProofCarryingReport,
        previous: &ProofCarryingReport,
    ) -> Result<(), RejectReason> {
        if report.timestamp <= previous.timestamp {
            return Err(RejectReason::TimeBackward);
        }
        let distance_m = geo::cell_distance_m(&previous.cell_id, &report.cell_id)
            .ok_or(RejectReason::MalformedReport)?;
        let elapsed_s = (report.timestamp - previous.timestamp) as f64;

        let speed = &self.config.speed_check;
        let reachable_m = speed.max_speed_kmh * 1000.0 / 3600.0 * elapsed_s + speed.tolerance_m;
        if distance_m > reachable_m {
            debug!(
                task_id = %report.task_id,
                distance_m,
                elapsed_s,
                reachable_m,
                "implausible movement between reports"
            );
            return Err(RejectReason::SpeedViolation);
        }
        Ok(())
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! Controlled de-anonymization.
//!
//! Only a caller presenting the authority key can map a task pseudonym back
//! to a vehicle. Every failure is terminal: a wrong key is
//! [`AuditError::PermissionDenied`], an unknown pseudonym is
//! [`AuditError::NotFound`], and nothing is ever guessed.

use crate::{AuditError, AuditStore};
use pcr_account_keys::AuditRecord;
use pcr_core_types::{unix_now, TaskId, UnixTimestamp};
use pcr_crypto_keys::SecretBytes;
use pcr_crypto_ring_signature::LinkTag;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashSet, sync::Arc};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// Summary of every pseudonym issued for a task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub task_id: TaskId,
    pub total_records: usize,
    pub unique_vehicles: usize,
    pub records: Vec<AuditRecord>,
    pub generated_at: UnixTimestamp,
}

pub struct AuditTrapdoor {
    authority_key: SecretBytes,
    store: Arc<dyn AuditStore>,
}

impl AuditTrapdoor {
    pub fn new(authority_key: SecretBytes, store: Arc<dyn AuditStore>) -> Self {
        Self {
            authority_key,
            store,
        }
    }

    /// Public fingerprint of the authority key, `SHA256(key)`, for
    /// identifying the authority without revealing the key.
    pub fn authority_fingerprint(&self) -> [u8; 32] {
        Sha256::digest(self.authority_key.as_bytes()).into()
    }

    fn authorize(&self, presented: &SecretBytes, operation: &'static str) -> Result<(), AuditError> {
        if bool::from(self.authority_key.ct_eq(presented)) {
            Ok(())
        } else {
            warn!(operation, "audit access denied: invalid authority key");
            Err(AuditError::PermissionDenied)
        }
    }

    /// Map `link_tag` in `task_id` back to its audit record.
    pub fn deanonymize(
        &self,
        task_id: &TaskId,
        link_tag: &LinkTag,
        authority_key: &SecretBytes,
    ) -> Result<AuditRecord, AuditError> {
        self.authorize(authority_key, "deanonymize")?;

        let record = self
            .store
            .get(task_id, link_tag)?
            .ok_or_else(|| AuditError::NotFound(task_id.clone()))?;

        info!(
            %task_id,
            link_tag = %link_tag.short(),
            "controlled de-anonymization performed"
        );
        Ok(record)
    }

    /// Every audit record of `task_id`, with counts.
    pub fn export_report(
        &self,
        task_id: &TaskId,
        authority_key: &SecretBytes,
    ) -> Result<AuditReport, AuditError> {
        self.authorize(authority_key, "export_report")?;

        let records = self.store.task_records(task_id)?;
        let unique_vehicles = records
            .iter()
            .map(|record| &record.vehicle_id)
            .collect::<HashSet<_>>()
            .len();

        info!(%task_id, total = records.len(), "exported audit report");
        Ok(AuditReport {
            task_id: task_id.clone(),
            total_records: records.len(),
            unique_vehicles,
            records,
            generated_at: unix_now(),
        })
    }
}

impl core::fmt::Debug for AuditTrapdoor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuditTrapdoor")
            .field("authority", &hex::encode(self.authority_fingerprint()))
            .finish_non_exhaustive()
    }
}

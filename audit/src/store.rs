// Copyright (c) 2018-2025 The Botho Foundation

//! Private storage of audit records.

use parking_lot::RwLock;
use pcr_account_keys::{AuditRecord, AuditSink, AuditSinkError};
use pcr_core_types::TaskId;
use pcr_crypto_ring_signature::LinkTag;
use std::collections::{BTreeMap, HashMap};

/// The audit authority's record store, keyed by `(task_id, link_tag)`.
///
/// Stores are also [`AuditSink`]s so that key derivation can write to them
/// directly.
pub trait AuditStore: AuditSink {
    fn get(&self, task_id: &TaskId, link_tag: &LinkTag)
        -> Result<Option<AuditRecord>, AuditSinkError>;

    /// All records of a task, ordered by link tag.
    fn task_records(&self, task_id: &TaskId) -> Result<Vec<AuditRecord>, AuditSinkError>;
}

#[derive(Default)]
pub struct InMemoryAuditStore {
    records: RwLock<HashMap<TaskId, BTreeMap<LinkTag, AuditRecord>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditStore {
    /// Re-deriving a task key yields the same link tag; the first record for
    /// a pseudonym is kept.
    fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        self.records
            .write()
            .entry(record.task_id.clone())
            .or_default()
            .entry(record.link_tag)
            .or_insert(record);
        Ok(())
    }
}

impl AuditStore for InMemoryAuditStore {
    fn get(
        &self,
        task_id: &TaskId,
        link_tag: &LinkTag,
    ) -> Result<Option<AuditRecord>, AuditSinkError> {
        Ok(self
            .records
            .read()
            .get(task_id)
            .and_then(|task| task.get(link_tag))
            .cloned())
    }

    fn task_records(&self, task_id: &TaskId) -> Result<Vec<AuditRecord>, AuditSinkError> {
        Ok(self
            .records
            .read()
            .get(task_id)
            .map(|task| task.values().cloned().collect())
            .unwrap_or_default())
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! Verifier-side submission bookkeeping: the duplicate ledger keyed by
//! `(task_id, link_tag)` and the RSU token nonce set.
//!
//! Both stores do check-and-insert as one step, so two workers racing on the
//! same key see exactly one first sighting. Spent nonces can be dropped once
//! their token is past expiry, since the verifier refuses such tokens anyway.

use parking_lot::Mutex;
use pcr_core_types::{TaskId, UnixTimestamp};
use pcr_crypto_ring_signature::{LinkTag, RingId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// What the ledger remembers about one accepted-so-far submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub ring_id: RingId,
    pub received_at: UnixTimestamp,
    #[serde(with = "hex")]
    pub report_digest: [u8; 32],
}

/// Result of recording a submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    /// Every earlier submission under the same key, oldest first.
    pub previous: Vec<SubmissionMetadata>,
}

pub trait DuplicateLedger: Send + Sync {
    /// Record a submission. The first sighting of `(task_id, link_tag)`
    /// returns `is_duplicate = false` and no history; later ones return
    /// `true` with all prior entries. Either way the submission is appended.
    fn record(
        &self,
        task_id: &TaskId,
        link_tag: &LinkTag,
        metadata: SubmissionMetadata,
    ) -> Result<DuplicateCheck, LedgerError>;

    /// Whether `(task_id, link_tag)` has been recorded, without recording.
    fn contains(&self, task_id: &TaskId, link_tag: &LinkTag) -> Result<bool, LedgerError>;
}

/// Spent RSU token nonces.
pub trait NonceStore: Send + Sync {
    /// Returns `true` if the `(window_id, nonce)` pair was fresh and is now
    /// spent, `false` if it had already been spent.
    ///
    /// `expiry_ts` is the token's expiry and `now` the verification time; a
    /// store may use them to forget nonces of long-expired tokens.
    fn insert_if_absent(
        &self,
        window_id: u64,
        nonce: u64,
        expiry_ts: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<bool, LedgerError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDuplicateLedger {
    entries: Mutex<HashMap<(TaskId, LinkTag), Vec<SubmissionMetadata>>>,
}

impl InMemoryDuplicateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link tags seen more than once in a task, with their submission count.
    pub fn duplicates(&self, task_id: &TaskId) -> Vec<(LinkTag, usize)> {
        let entries = self.entries.lock();
        let mut out: Vec<_> = entries
            .iter()
            .filter(|((task, _), subs)| task == task_id && subs.len() > 1)
            .map(|((_, tag), subs)| (*tag, subs.len()))
            .collect();
        out.sort();
        out
    }

    /// Number of distinct `(task_id, link_tag)` keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DuplicateLedger for InMemoryDuplicateLedger {
    fn record(
        &self,
        task_id: &TaskId,
        link_tag: &LinkTag,
        metadata: SubmissionMetadata,
    ) -> Result<DuplicateCheck, LedgerError> {
        let mut entries = self.entries.lock();
        let submissions = entries.entry((task_id.clone(), *link_tag)).or_default();
        let check = DuplicateCheck {
            is_duplicate: !submissions.is_empty(),
            previous: submissions.clone(),
        };
        submissions.push(metadata);
        Ok(check)
    }

    fn contains(&self, task_id: &TaskId, link_tag: &LinkTag) -> Result<bool, LedgerError> {
        Ok(self
            .entries
            .lock()
            .contains_key(&(task_id.clone(), *link_tag)))
    }
}

/// In-memory spent nonce set.
///
/// With a retention period, a nonce is forgotten once its token expired more
/// than `retention_s` seconds before the current verification time. Only use
/// that mode when expired tokens are refused before reaching the store.
#[derive(Debug, Default)]
pub struct InMemoryNonceStore {
    retention_s: Option<u64>,
    spent: Mutex<SpentNonces>,
}

#[derive(Debug, Default)]
struct SpentNonces {
    by_key: HashMap<(u64, u64), UnixTimestamp>,
    by_expiry: BTreeSet<(UnixTimestamp, u64, u64)>,
}

impl SpentNonces {
    /// Drop every nonce whose token expired before `cutoff`.
    fn evict_before(&mut self, cutoff: UnixTimestamp) -> usize {
        let live = self.by_expiry.split_off(&(cutoff, 0, 0));
        let expired = std::mem::replace(&mut self.by_expiry, live);
        for (_, window_id, nonce) in &expired {
            self.by_key.remove(&(*window_id, *nonce));
        }
        expired.len()
    }
}

impl InMemoryNonceStore {
    /// A store that never forgets a spent nonce.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that forgets nonces `retention_s` seconds after their token
    /// expired.
    pub fn with_retention(retention_s: u64) -> Self {
        Self {
            retention_s: Some(retention_s),
            spent: Mutex::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.spent.lock().by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.lock().by_key.is_empty()
    }
}

impl NonceStore for InMemoryNonceStore {
    fn insert_if_absent(
        &self,
        window_id: u64,
        nonce: u64,
        expiry_ts: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<bool, LedgerError> {
        let mut spent = self.spent.lock();
        if let Some(retention_s) = self.retention_s {
            let evicted = spent.evict_before(now.saturating_sub(retention_s));
            if evicted > 0 {
                debug!(evicted, remaining = spent.by_key.len(), "evicted expired token nonces");
            }
        }

        if spent.by_key.contains_key(&(window_id, nonce)) {
            return Ok(false);
        }
        spent.by_key.insert((window_id, nonce), expiry_ts);
        spent.by_expiry.insert((expiry_ts, window_id, nonce));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    fn meta(received_at: UnixTimestamp) -> SubmissionMetadata {
        SubmissionMetadata {
            ring_id: RingId::compute(&TaskId::from("T"), &[]),
            received_at,
            report_digest: [received_at as u8; 32],
        }
    }

    #[test]
    fn first_sighting_then_duplicates_with_history() {
        let ledger = InMemoryDuplicateLedger::new();
        let task = TaskId::from("T");
        let tag = LinkTag::from([1u8; 32]);

        let first = ledger.record(&task, &tag, meta(1)).unwrap();
        assert_eq!(first, DuplicateCheck::default());

        let second = ledger.record(&task, &tag, meta(2)).unwrap();
        assert!(second.is_duplicate);
        assert_eq!(second.previous, vec![meta(1)]);

        let third = ledger.record(&task, &tag, meta(3)).unwrap();
        assert_eq!(third.previous, vec![meta(1), meta(2)]);

        assert_eq!(ledger.duplicates(&task), vec![(tag, 3)]);
    }

    #[test]
    fn same_tag_in_another_task_is_not_a_duplicate() {
        let ledger = InMemoryDuplicateLedger::new();
        let tag = LinkTag::from([9u8; 32]);

        ledger.record(&TaskId::from("T1"), &tag, meta(1)).unwrap();
        let other = ledger.record(&TaskId::from("T2"), &tag, meta(2)).unwrap();
        assert!(!other.is_duplicate);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.duplicates(&TaskId::from("T1")).is_empty());
    }

    #[test]
    fn racing_records_see_one_first_sighting() {
        let ledger = Arc::new(InMemoryDuplicateLedger::new());
        let task = TaskId::from("T");
        let tag = LinkTag::from([4u8; 32]);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ledger = ledger.clone();
                let task = task.clone();
                thread::spawn(move || ledger.record(&task, &tag, meta(i)).unwrap().is_duplicate)
            })
            .collect();
        let firsts = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|dup| !dup)
            .count();
        assert_eq!(firsts, 1);
    }

    #[test]
    fn contains_does_not_record() {
        let ledger = InMemoryDuplicateLedger::new();
        let task = TaskId::from("T");
        let tag = LinkTag::from([2u8; 32]);

        assert!(!ledger.contains(&task, &tag).unwrap());
        assert!(ledger.is_empty());
        ledger.record(&task, &tag, meta(1)).unwrap();
        assert!(ledger.contains(&task, &tag).unwrap());
        assert!(!ledger.contains(&TaskId::from("T2"), &tag).unwrap());
    }

    #[test]
    fn nonce_is_spent_once() {
        let store = InMemoryNonceStore::new();
        assert!(store.insert_if_absent(42, 7, 1_000, 10).unwrap());
        assert!(!store.insert_if_absent(42, 7, 1_000, 10).unwrap());
        assert!(store.insert_if_absent(42, 8, 1_000, 10).unwrap());
        assert!(store.insert_if_absent(43, 7, 1_000, 10).unwrap());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn nonces_without_retention_are_kept_forever() {
        let store = InMemoryNonceStore::new();
        assert!(store.insert_if_absent(1, 1, 100, 50).unwrap());
        assert!(store.insert_if_absent(1, 2, 100, u64::MAX).unwrap());
        assert!(!store.insert_if_absent(1, 1, 100, u64::MAX).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn expired_nonces_are_evicted_after_retention() {
        let store = InMemoryNonceStore::with_retention(60);
        assert!(store.insert_if_absent(1, 1, 100, 50).unwrap());
        assert!(store.insert_if_absent(1, 2, 1_000, 50).unwrap());

        // Expired for exactly the retention period: still remembered.
        assert!(!store.insert_if_absent(1, 1, 100, 160).unwrap());
        assert_eq!(store.len(), 2);

        assert!(store.insert_if_absent(1, 3, 1_000, 161).unwrap());
        assert_eq!(store.len(), 2);
        assert!(!store.insert_if_absent(1, 2, 1_000, 161).unwrap());
        assert!(!store.insert_if_absent(1, 3, 1_000, 161).unwrap());
    }

    #[test]
    fn racing_nonce_spends_see_one_fresh_insert() {
        let store = Arc::new(InMemoryNonceStore::with_retention(0));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.insert_if_absent(9, 9, 1_000, 500).unwrap())
            })
            .collect();
        let fresh = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fresh| *fresh)
            .count();
        assert_eq!(fresh, 1);
    }
}

// Copyright (c) 2018-2025 The Botho Foundation

//! Task rings and the write-once ring registry.

use crate::{domain_separators::RING_ID_DOMAIN_TAG, Error};
use core::fmt;
use parking_lot::RwLock;
use pcr_core_types::{append_length_prefixed, TaskId, UnixTimestamp};
use pcr_crypto_keys::RistrettoPublic;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::info;

/// Content hash of a ring: task id, ring size and members in order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RingId(#[serde(with = "hex")] [u8; 32]);

impl RingId {
    pub fn compute(task_id: &TaskId, members: &[RistrettoPublic]) -> Self {
        let mut buf = Vec::with_capacity(16 + task_id.as_bytes().len() + 32 * members.len());
        append_length_prefixed(&mut buf, task_id.as_bytes());
        buf.extend_from_slice(&(members.len() as u64).to_le_bytes());
        for member in members {
            buf.extend_from_slice(member.as_bytes());
        }

        let mut hasher = Sha256::new();
        hasher.update(RING_ID_DOMAIN_TAG);
        hasher.update(&buf);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RingId({})", hex::encode(self.0))
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// The ordered anonymity set of one task.
///
/// Immutable once built. Deserialization recomputes the ring id and refuses a
/// ring whose id does not match its contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyRingRepr", into = "PublicKeyRingRepr")]
pub struct PublicKeyRing {
    ring_id: RingId,
    task_id: TaskId,
    members: Vec<RistrettoPublic>,
    creation_time: UnixTimestamp,
}

impl PublicKeyRing {
    /// Build a ring; fails on an empty member list or a repeated key.
    pub fn build(
        task_id: TaskId,
        members: Vec<RistrettoPublic>,
        creation_time: UnixTimestamp,
    ) -> Result<Self, Error> {
        if members.is_empty() {
            return Err(Error::EmptyRing);
        }
        let mut seen = HashSet::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            if !seen.insert(member) {
                return Err(Error::DuplicateRingMember(index));
            }
        }

        Ok(Self {
            ring_id: RingId::compute(&task_id, &members),
            task_id,
            members,
            creation_time,
        })
    }

    pub fn ring_id(&self) -> &RingId {
        &self.ring_id
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn members(&self) -> &[RistrettoPublic] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn creation_time(&self) -> UnixTimestamp {
        self.creation_time
    }

    /// Ring position of `public_key`.
    pub fn index_of(&self, public_key: &RistrettoPublic) -> Result<usize, Error> {
        self.members
            .iter()
            .position(|member| member == public_key)
            .ok_or(Error::SignerNotInRing)
    }
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRingRepr {
    ring_id: RingId,
    task_id: TaskId,
    members: Vec<RistrettoPublic>,
    creation_time: UnixTimestamp,
}

impl TryFrom<PublicKeyRingRepr> for PublicKeyRing {
    type Error = Error;

    fn try_from(repr: PublicKeyRingRepr) -> Result<Self, Error> {
        let ring = PublicKeyRing::build(repr.task_id, repr.members, repr.creation_time)?;
        if ring.ring_id != repr.ring_id {
            return Err(Error::RingIdMismatch);
        }
        Ok(ring)
    }
}

impl From<PublicKeyRing> for PublicKeyRingRepr {
    fn from(ring: PublicKeyRing) -> Self {
        Self {
            ring_id: ring.ring_id,
            task_id: ring.task_id,
            members: ring.members,
            creation_time: ring.creation_time,
        }
    }
}

/// Finalized rings by task. Each task gets exactly one ring, before any
/// signing happens; afterwards the registry is read-only for that task.
#[derive(Default)]
pub struct RingRegistry {
    rings: RwLock<HashMap<TaskId, Arc<PublicKeyRing>>>,
}

impl RingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the ring for its task. A second ring for the same task is
    /// refused, even if identical.
    pub fn finalize(&self, ring: PublicKeyRing) -> Result<Arc<PublicKeyRing>, Error> {
        let mut rings = self.rings.write();
        if rings.contains_key(ring.task_id()) {
            return Err(Error::RingAlreadyFinalized(ring.task_id().clone()));
        }

        info!(
            task_id = %ring.task_id(),
            ring_id = %ring.ring_id(),
            ring_size = ring.len(),
            "finalized task ring"
        );
        let ring = Arc::new(ring);
        rings.insert(ring.task_id().clone(), ring.clone());
        Ok(ring)
    }

    pub fn get(&self, task_id: &TaskId) -> Option<Arc<PublicKeyRing>> {
        self.rings.read().get(task_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcr_crypto_keys::RistrettoPrivate;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn members(n: usize, seed: u64) -> Vec<RistrettoPublic> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| RistrettoPrivate::from_random(&mut rng).public_key())
            .collect()
    }

    #[test]
    fn ring_id_depends_on_task_and_members() {
        let keys = members(4, 1);
        let task = TaskId::from("task-001");
        let a = PublicKeyRing::build(task.clone(), keys.clone(), 10).unwrap();
        let b = PublicKeyRing::build(TaskId::from("task-002"), keys.clone(), 10).unwrap();
        let c = PublicKeyRing::build(task.clone(), keys[..3].to_vec(), 10).unwrap();
        let mut reordered = keys.clone();
        reordered.swap(0, 3);
        let d = PublicKeyRing::build(task.clone(), reordered, 10).unwrap();

        assert_ne!(a.ring_id(), b.ring_id());
        assert_ne!(a.ring_id(), c.ring_id());
        assert_ne!(a.ring_id(), d.ring_id());
        // Creation time is metadata, not content.
        let e = PublicKeyRing::build(task, keys, 99).unwrap();
        assert_eq!(a.ring_id(), e.ring_id());
    }

    #[test]
    fn empty_and_duplicate_rings_are_rejected() {
        let task = TaskId::from("t");
        assert_eq!(
            PublicKeyRing::build(task.clone(), vec![], 0),
            Err(Error::EmptyRing)
        );
        let mut keys = members(3, 2);
        keys.push(keys[1]);
        assert_eq!(
            PublicKeyRing::build(task, keys, 0),
            Err(Error::DuplicateRingMember(3))
        );
    }

    #[test]
    fn index_of_finds_members() {
        let keys = members(5, 3);
        let ring = PublicKeyRing::build(TaskId::from("t"), keys.clone(), 0).unwrap();
        assert_eq!(ring.index_of(&keys[3]), Ok(3));
        assert_eq!(
            ring.index_of(&members(1, 4)[0]),
            Err(Error::SignerNotInRing)
        );
    }

    #[test]
    fn serde_roundtrip_checks_ring_id() {
        let ring = PublicKeyRing::build(TaskId::from("t"), members(3, 5), 7).unwrap();
        let json = serde_json::to_string(&ring).unwrap();
        let back: PublicKeyRing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ring);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["task_id"] = serde_json::Value::String("other".into());
        assert!(serde_json::from_value::<PublicKeyRing>(value).is_err());
    }

    #[test]
    fn registry_is_write_once() {
        let registry = RingRegistry::new();
        let task = TaskId::from("task-001");
        let ring = PublicKeyRing::build(task.clone(), members(3, 6), 0).unwrap();

        let stored = registry.finalize(ring.clone()).unwrap();
        assert_eq!(*stored, ring);
        assert_eq!(
            registry.finalize(ring.clone()).unwrap_err(),
            Error::RingAlreadyFinalized(task.clone())
        );
        assert_eq!(*registry.get(&task).unwrap(), ring);
        assert!(registry.get(&TaskId::from("unknown")).is_none());
        assert_eq!(registry.len(), 1);
    }
}

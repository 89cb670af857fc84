// Copyright (c) 2018-2025 The Botho Foundation

//! Task-scoped keys.
//!
//! ```text
//! master_sk
//!    │
//!    └── HKDF-SHA256(salt = SHA256(task_id), info = "pcr_task_key_derivation")
//!           │
//!           └── derived_sk ──► derived_pk = derived_sk * G
//!                    │
//!                    └── key_image = derived_sk * Hp(derived_pk) ──► link_tag
//! ```
//!
//! The same (master secret, task) pair always yields the same key. Distinct
//! tasks use distinct salts, so a vehicle's keys for two tasks are unrelated.

use crate::{domain_separators::TASK_KEY_DERIVATION_INFO, hkdf_scalar, Result};
use pcr_core_types::TaskId;
use pcr_crypto_keys::{RistrettoPrivate, RistrettoPublic, SecretBytes};
use pcr_crypto_ring_signature::{KeyImage, LinkTag};
use sha2::{Digest, Sha256};

/// A vehicle's signing key for one task.
#[derive(Clone, Debug)]
pub struct TaskKey {
    task_id: TaskId,
    derived_sk: RistrettoPrivate,
    derived_pk: RistrettoPublic,
    key_image: KeyImage,
    link_tag: LinkTag,
}

impl TaskKey {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn derived_sk(&self) -> &RistrettoPrivate {
        &self.derived_sk
    }

    pub fn derived_pk(&self) -> &RistrettoPublic {
        &self.derived_pk
    }

    pub fn key_image(&self) -> &KeyImage {
        &self.key_image
    }

    pub fn link_tag(&self) -> &LinkTag {
        &self.link_tag
    }
}

/// Derive the task key of `master_sk` for `task_id`.
pub fn derive_task_key(master_sk: &SecretBytes, task_id: &TaskId) -> Result<TaskKey> {
    let salt: [u8; 32] = Sha256::digest(task_id.as_bytes()).into();
    let derived_sk = RistrettoPrivate::from(hkdf_scalar(
        &salt,
        master_sk.as_bytes(),
        TASK_KEY_DERIVATION_INFO,
    )?);

    let derived_pk = derived_sk.public_key();
    let key_image = KeyImage::from(&derived_sk);
    let link_tag = LinkTag::derive(&key_image, task_id);

    Ok(TaskKey {
        task_id: task_id.clone(),
        derived_sk,
        derived_pk,
        key_image,
        link_tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn derivation_is_idempotent() {
        let master = SecretBytes::from([3u8; 32]);
        let task = TaskId::from("task-001");
        let a = derive_task_key(&master, &task).unwrap();
        let b = derive_task_key(&master, &task).unwrap();
        assert_eq!(a.derived_sk().to_bytes(), b.derived_sk().to_bytes());
        assert_eq!(a.derived_pk(), b.derived_pk());
        assert_eq!(a.link_tag(), b.link_tag());
    }

    #[test]
    fn tasks_get_unrelated_keys() {
        let master = SecretBytes::from([4u8; 32]);
        let a = derive_task_key(&master, &TaskId::from("task-001")).unwrap();
        let b = derive_task_key(&master, &TaskId::from("task-002")).unwrap();
        assert_ne!(a.derived_pk(), b.derived_pk());
        assert_ne!(a.link_tag(), b.link_tag());
    }

    #[test]
    fn link_tag_matches_key_image() {
        let master = SecretBytes::from([5u8; 32]);
        let task = TaskId::from("task-001");
        let key = derive_task_key(&master, &task).unwrap();
        assert_eq!(*key.link_tag(), LinkTag::derive(key.key_image(), &task));
        assert_eq!(*key.key_image(), KeyImage::from(key.derived_sk()));
    }

    #[test]
    fn ten_thousand_tasks_have_distinct_link_tags() {
        let master = SecretBytes::from([6u8; 32]);
        let mut tags = HashSet::new();
        for i in 0..10_000 {
            let key = derive_task_key(&master, &TaskId::new(format!("task-{i:05}"))).unwrap();
            assert!(tags.insert(*key.link_tag()), "collision at task {i}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn distinct_vehicles_distinct_tags(a in prop::array::uniform32(any::<u8>()), b in prop::array::uniform32(any::<u8>())) {
            prop_assume!(a != b);
            let task = TaskId::from("task-001");
            let ka = derive_task_key(&SecretBytes::from(a), &task).unwrap();
            let kb = derive_task_key(&SecretBytes::from(b), &task).unwrap();
            prop_assert_ne!(ka.link_tag(), kb.link_tag());
        }
    }
}

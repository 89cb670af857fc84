// Copyright (c) 2018-2025 The Botho Foundation

use pcr_core_types::{TaskId, UnixTimestamp};
use pcr_crypto_merkle::{MerkleRoot, MerkleWhitelist};
use serde::{Deserialize, Serialize};

/// What a verifier authorizes for one task: where (whitelist root), when
/// (time window) and under which signing context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPolicy {
    pub task_id: TaskId,
    pub whitelist_root: MerkleRoot,
    pub window_lower: UnixTimestamp,
    pub window_upper: UnixTimestamp,
    #[serde(with = "hex")]
    pub context: Vec<u8>,
}

impl TaskPolicy {
    /// Policy over `whitelist` and `[window_lower, window_upper]` with the
    /// default signing context of the task.
    pub fn new(
        task_id: TaskId,
        whitelist: &MerkleWhitelist,
        window_lower: UnixTimestamp,
        window_upper: UnixTimestamp,
    ) -> Self {
        let context = Self::default_context(&task_id);
        Self {
            task_id,
            whitelist_root: whitelist.root(),
            window_lower,
            window_upper,
            context,
        }
    }

    /// Whether `timestamp` lies in `[window_lower, window_upper]`.
    pub fn covers(&self, timestamp: UnixTimestamp) -> bool {
        (self.window_lower..=self.window_upper).contains(&timestamp)
    }

    /// `pcr|<task_id>|v1`
    pub fn default_context(task_id: &TaskId) -> Vec<u8> {
        format!("pcr|{task_id}|v1").into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_are_inclusive() {
        let whitelist = MerkleWhitelist::build(["g1"]).unwrap();
        let policy = TaskPolicy::new(TaskId::from("T"), &whitelist, 100, 200);
        assert!(policy.covers(100));
        assert!(policy.covers(200));
        assert!(!policy.covers(99));
        assert!(!policy.covers(201));
        assert_eq!(policy.context, b"pcr|T|v1");
    }
}

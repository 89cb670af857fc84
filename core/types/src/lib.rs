// Copyright (c) 2018-2025 The Botho Foundation

//! Core type definitions shared by every crate of the proof-carrying report
//! workspace.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of a crowdsensing task.
///
/// Task ids are opaque strings chosen by the task publisher. They are bound
/// into key derivation, ring ids and signed report messages byte for byte, so
/// no normalization is ever applied.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(src: &str) -> Self {
        Self(src.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(src: String) -> Self {
        Self(src)
    }
}

/// Identifier of an enrolled vehicle. Only the vehicle itself and the audit
/// authority ever see it.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(src: &str) -> Self {
        Self(src.to_owned())
    }
}

/// Seconds since the unix epoch.
pub type UnixTimestamp = u64;

/// Current wall-clock time in seconds since the unix epoch.
///
/// A clock set before 1970 reads as zero rather than panicking.
pub fn unix_now() -> UnixTimestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Appends `bytes` to `out` prefixed with its length as a little-endian u64.
///
/// Every hash input that mixes variable-length fields goes through this so
/// that field boundaries can never shift.
pub fn append_length_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_serializes_as_plain_string() {
        let id = TaskId::from("task-001");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"task-001\"");
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn length_prefix_separates_fields() {
        let mut a = Vec::new();
        append_length_prefixed(&mut a, b"ab");
        append_length_prefixed(&mut a, b"c");

        let mut b = Vec::new();
        append_length_prefixed(&mut b, b"a");
        append_length_prefixed(&mut b, b"bc");

        assert_ne!(a, b);
        assert_eq!(a.len(), 8 + 2 + 8 + 1);
    }

    #[test]
    fn unix_now_is_after_2020() {
        assert!(unix_now() > 1_577_836_800);
    }
}

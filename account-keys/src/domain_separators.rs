// Copyright (c) 2018-2025 The Botho Foundation

/// HKDF info string for task key derivation.
pub const TASK_KEY_DERIVATION_INFO: &[u8] = b"pcr_task_key_derivation";

/// HKDF salt for the vehicle's long-term public key. Kept apart from every
/// task salt (which is a SHA-256 digest of a task id).
pub const MASTER_PUBLIC_KEY_SALT: &[u8] = b"pcr_master_public_key";

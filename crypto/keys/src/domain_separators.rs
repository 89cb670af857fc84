// Copyright (c) 2018-2025 The Botho Foundation

//! Domain separation tags for hashing in the keys crate.

/// Domain separator for hashing a public key to a curve point.
pub const HASH_TO_POINT_DOMAIN_TAG: &[u8] = b"pcr_hash_to_point";

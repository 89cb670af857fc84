// Copyright (c) 2018-2025 The Botho Foundation

//! Domain separation tags for the ring signature crate.

/// Domain separator for LSAG round hashes.
pub const LSAG_ROUND_HASH_DOMAIN_TAG: &[u8] = b"pcr_lsag_round_hash";

/// Domain separator for the digest of the ring members bound into each round.
pub const LSAG_RING_DIGEST_DOMAIN_TAG: &[u8] = b"pcr_lsag_ring_digest";

/// Domain separator for the message wrapper that binds task and ring ids.
pub const LSAG_MESSAGE_DOMAIN_TAG: &[u8] = b"pcr_lsag_message";

/// Domain separator for ring ids.
pub const RING_ID_DOMAIN_TAG: &[u8] = b"pcr_ring_id";

/// Domain separator for link tags.
pub const LINK_TAG_DOMAIN_TAG: &[u8] = b"pcr_link_tag";

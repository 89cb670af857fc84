// Copyright (c) 2018-2025 The Botho Foundation

//! Merkle whitelist of authorized location cells.
//!
//! A task publisher commits to the set of authorized geohash cells with a
//! Merkle root. A vehicle proves its cell is in the set by presenting the
//! bottom-up list of sibling hashes, without revealing the rest of the set.
//!
//! ```text
//! leaf = SHA256(0x00 || cell)
//! node = SHA256(0x01 || left || right)
//! ```
//!
//! The last node of an odd-sized level is paired with itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashSet, fmt};
use thiserror::Error;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Longest proof accepted by [`MerkleWhitelist::verify`].
pub const MAX_PROOF_DEPTH: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("whitelist must contain at least one cell")]
    EmptyWhitelist,

    #[error("cell at index {0} appears more than once")]
    DuplicateLeaf(usize),
}

/// A 32-byte SHA-256 tree hash, hex encoded on the wire.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MerkleHash(#[serde(with = "hex")] pub [u8; 32]);

/// The public commitment to a whitelist.
pub type MerkleRoot = MerkleHash;

impl MerkleHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerkleHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Sibling hashes from the leaf level up to just below the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub siblings: Vec<MerkleHash>,
}

impl MerkleProof {
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }
}

fn hash_leaf(leaf: &[u8]) -> MerkleHash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(leaf);
    MerkleHash(hasher.finalize().into())
}

fn hash_node(left: &MerkleHash, right: &MerkleHash) -> MerkleHash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left.0);
    hasher.update(right.0);
    MerkleHash(hasher.finalize().into())
}

/// An in-memory Merkle tree over an ordered list of distinct cells.
#[derive(Clone, Debug)]
pub struct MerkleWhitelist {
    leaves: Vec<Vec<u8>>,
    /// Level 0 holds leaf hashes; the last level holds only the root.
    levels: Vec<Vec<MerkleHash>>,
}

impl MerkleWhitelist {
    /// Build the tree over `leaves`, keeping their order.
    pub fn build<I, L>(leaves: I) -> Result<Self, MerkleError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let leaves: Vec<Vec<u8>> = leaves.into_iter().map(|l| l.as_ref().to_vec()).collect();
        if leaves.is_empty() {
            return Err(MerkleError::EmptyWhitelist);
        }

        let mut seen = HashSet::with_capacity(leaves.len());
        for (index, leaf) in leaves.iter().enumerate() {
            if !seen.insert(leaf.as_slice()) {
                return Err(MerkleError::DuplicateLeaf(index));
            }
        }

        let mut current: Vec<MerkleHash> = leaves.iter().map(|l| hash_leaf(l)).collect();
        let mut levels = vec![current.clone()];
        while current.len() > 1 {
            current = current
                .chunks(2)
                .map(|pair| hash_node(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(current.clone());
        }

        Ok(Self { leaves, levels })
    }

    pub fn root(&self) -> MerkleRoot {
        // `build` guarantees a non-empty top level.
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &[u8]> {
        self.leaves.iter().map(Vec::as_slice)
    }

    /// Inclusion proof for the leaf at `index`, or `None` when out of range.
    pub fn prove(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = if idx % 2 == 0 {
                level.get(idx + 1).unwrap_or(&level[idx])
            } else {
                &level[idx - 1]
            };
            siblings.push(*sibling);
            idx /= 2;
        }

        Some(MerkleProof { siblings })
    }

    /// Index and inclusion proof for `leaf`, if it is whitelisted.
    pub fn prove_leaf(&self, leaf: impl AsRef<[u8]>) -> Option<(u64, MerkleProof)> {
        let leaf = leaf.as_ref();
        let index = self.leaves.iter().position(|l| l.as_slice() == leaf)?;
        self.prove(index).map(|proof| (index as u64, proof))
    }

    /// Check that `leaf` sits at `index` under `root`.
    ///
    /// Rejects proofs deeper than [`MAX_PROOF_DEPTH`], indices that do not fit
    /// in the proof depth, and right-hand steps whose sibling equals the
    /// running hash. Padding only ever duplicates a left node, so such a step
    /// would let a proof for the last leaf of an odd level also verify at the
    /// phantom index after it.
    pub fn verify(leaf: &[u8], proof: &MerkleProof, root: &MerkleRoot, index: u64) -> bool {
        if proof.siblings.len() > MAX_PROOF_DEPTH {
            return false;
        }

        let mut hash = hash_leaf(leaf);
        let mut idx = index;
        for sibling in &proof.siblings {
            if idx % 2 == 0 {
                hash = hash_node(&hash, sibling);
            } else {
                if *sibling == hash {
                    return false;
                }
                hash = hash_node(sibling, &hash);
            }
            idx /= 2;
        }

        idx == 0 && hash == *root
    }
}

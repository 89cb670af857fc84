// Copyright (c) 2018-2025 The Botho Foundation

#![deny(unsafe_code)]

//! Vehicle identities and task-scoped key derivation.
//!
//! Each enrolled vehicle holds a master secret. For every task it joins, it
//! derives a fresh signing key whose public half goes into the task ring.
//! The derivation is recorded for the audit authority through an
//! [`AuditSink`], which is the only place the task pseudonym is tied back to
//! the vehicle.

mod audit;
mod deriver;
mod domain_separators;
mod error;
mod identity;
mod task_key;

pub use crate::{
    audit::{AuditRecord, AuditSink},
    deriver::TaskKeyDeriver,
    error::{AuditSinkError, Error, Result},
    identity::VehicleIdentity,
    task_key::{derive_task_key, TaskKey},
};

use curve25519_dalek::scalar::Scalar;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// HKDF-SHA256 extract-and-expand to 32 bytes, reduced to a scalar.
fn hkdf_scalar(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<Scalar> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; 32];
    hk.expand(info, &mut okm).map_err(|_| Error::Kdf)?;

    // Reduce modulo the group order so that the key has a canonical encoding.
    let scalar = Scalar::from_bytes_mod_order(okm);
    okm.zeroize();
    Ok(scalar)
}

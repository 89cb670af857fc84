// Copyright (c) 2018-2025 The Botho Foundation

//! Long-term vehicle identity.
//!
//! A vehicle enrolls once with 32 bytes of master secret. Its public key is
//! derived from that secret under its own HKDF salt, and every task key is
//! derived from the same secret under a per-task salt (see
//! [`crate::derive_task_key`]).

use crate::{domain_separators::MASTER_PUBLIC_KEY_SALT, hkdf_scalar, Result};
use pcr_core_types::{UnixTimestamp, VehicleId};
use pcr_crypto_keys::{RistrettoPrivate, RistrettoPublic, SecretBytes};
use rand_core::CryptoRngCore;

const MASTER_PUBLIC_KEY_INFO: &[u8] = b"master";

/// Enrollment record held by the vehicle for its whole life.
#[derive(Clone, Debug)]
pub struct VehicleIdentity {
    vehicle_id: VehicleId,
    master_sk: SecretBytes,
    master_pk: RistrettoPublic,
    registration_time: UnixTimestamp,
}

impl VehicleIdentity {
    /// Enroll a vehicle with fresh master entropy.
    pub fn enroll(
        vehicle_id: VehicleId,
        rng: &mut dyn CryptoRngCore,
        registration_time: UnixTimestamp,
    ) -> Result<Self> {
        Self::from_secret(vehicle_id, SecretBytes::from_random(rng), registration_time)
    }

    /// Rebuild an identity from a stored master secret.
    pub fn from_secret(
        vehicle_id: VehicleId,
        master_sk: SecretBytes,
        registration_time: UnixTimestamp,
    ) -> Result<Self> {
        let master_pk = master_public_key(&master_sk)?;
        Ok(Self {
            vehicle_id,
            master_sk,
            master_pk,
            registration_time,
        })
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn master_sk(&self) -> &SecretBytes {
        &self.master_sk
    }

    pub fn master_pk(&self) -> &RistrettoPublic {
        &self.master_pk
    }

    pub fn registration_time(&self) -> UnixTimestamp {
        self.registration_time
    }
}

fn master_public_key(master_sk: &SecretBytes) -> Result<RistrettoPublic> {
    let scalar = hkdf_scalar(
        MASTER_PUBLIC_KEY_SALT,
        master_sk.as_bytes(),
        MASTER_PUBLIC_KEY_INFO,
    )?;
    Ok(RistrettoPrivate::from(scalar).public_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn master_pk_is_a_function_of_the_secret() {
        let a = VehicleIdentity::from_secret("v1".into(), SecretBytes::from([1u8; 32]), 0).unwrap();
        let b = VehicleIdentity::from_secret("v1".into(), SecretBytes::from([1u8; 32]), 5).unwrap();
        let c = VehicleIdentity::from_secret("v1".into(), SecretBytes::from([2u8; 32]), 0).unwrap();
        assert_eq!(a.master_pk(), b.master_pk());
        assert_ne!(a.master_pk(), c.master_pk());
    }

    #[test]
    fn enroll_keeps_metadata() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let id = VehicleIdentity::enroll(VehicleId::from("veh-042"), &mut rng, 1_700_000_000).unwrap();
        assert_eq!(id.vehicle_id().as_str(), "veh-042");
        assert_eq!(id.registration_time(), 1_700_000_000);
        assert!(!format!("{id:?}").contains(&format!("{:?}", id.master_sk().as_bytes())));
    }
}

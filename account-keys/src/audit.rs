// Copyright (c) 2018-2025 The Botho Foundation

use crate::AuditSinkError;
use pcr_core_types::{TaskId, UnixTimestamp, VehicleId};
use pcr_crypto_keys::RistrettoPublic;
use pcr_crypto_ring_signature::LinkTag;
use serde::{Deserialize, Serialize};

/// Binds a task pseudonym back to the vehicle that owns it.
///
/// Written once per task key derivation and only ever readable by the audit
/// authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub vehicle_id: VehicleId,
    pub master_pk: RistrettoPublic,
    pub task_id: TaskId,
    pub derived_pk: RistrettoPublic,
    pub link_tag: LinkTag,
    pub timestamp: UnixTimestamp,
}

/// Destination of audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derive_task_key, VehicleIdentity};
    use pcr_crypto_keys::SecretBytes;

    #[test]
    fn record_serializes_keys_as_hex() {
        let identity =
            VehicleIdentity::from_secret(VehicleId::from("veh-7"), SecretBytes::from([7u8; 32]), 5)
                .unwrap();
        let task_id = TaskId::from("task-7");
        let key = derive_task_key(identity.master_sk(), &task_id).unwrap();
        let record = AuditRecord {
            vehicle_id: identity.vehicle_id().clone(),
            master_pk: *identity.master_pk(),
            task_id,
            derived_pk: *key.derived_pk(),
            link_tag: *key.link_tag(),
            timestamp: 9,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["vehicle_id"], "veh-7");
        assert_eq!(json["link_tag"], key.link_tag().to_hex());
        assert_eq!(json["derived_pk"], key.derived_pk().to_hex());

        let back: AuditRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}

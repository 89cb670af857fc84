// Copyright (c) 2018-2025 The Botho Foundation

use crate::{derive_task_key, AuditRecord, AuditSink, Result, TaskKey, VehicleIdentity};
use pcr_core_types::{TaskId, UnixTimestamp};
use pcr_crypto_ring_signature::PublicKeyRing;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Task key derivation with audit bookkeeping.
///
/// Every issued task key has a matching [`AuditRecord`] in the sink. When the
/// sink refuses the record, no key is returned.
#[derive(Clone)]
pub struct TaskKeyDeriver {
    sink: Arc<dyn AuditSink>,
}

impl TaskKeyDeriver {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn derive(
        &self,
        identity: &VehicleIdentity,
        task_id: &TaskId,
        now: UnixTimestamp,
    ) -> Result<TaskKey> {
        let key = derive_task_key(identity.master_sk(), task_id)?;

        let record = AuditRecord {
            vehicle_id: identity.vehicle_id().clone(),
            master_pk: *identity.master_pk(),
            task_id: task_id.clone(),
            derived_pk: *key.derived_pk(),
            link_tag: *key.link_tag(),
            timestamp: now,
        };
        if let Err(err) = self.sink.record(record) {
            warn!(%task_id, %err, "audit sink refused record; task key withheld");
            return Err(err.into());
        }

        debug!(%task_id, link_tag = %key.link_tag().short(), "derived task key");
        Ok(key)
    }

    /// Derive keys for every enrolled vehicle of a task and build the task
    /// ring from their public keys, in the order given.
    pub fn enroll_cohort(
        &self,
        task_id: &TaskId,
        identities: &[VehicleIdentity],
        now: UnixTimestamp,
    ) -> Result<(PublicKeyRing, Vec<TaskKey>)> {
        let keys = identities
            .iter()
            .map(|identity| self.derive(identity, task_id, now))
            .collect::<Result<Vec<_>>>()?;

        let ring = PublicKeyRing::build(
            task_id.clone(),
            keys.iter().map(|key| *key.derived_pk()).collect(),
            now,
        )?;

        info!(%task_id, ring_size = ring.len(), "enrolled task cohort");
        Ok((ring, keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditSinkError;
    use parking_lot::Mutex;
    use pcr_core_types::VehicleId;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl AuditSink for MemorySink {
        fn record(&self, record: AuditRecord) -> core::result::Result<(), AuditSinkError> {
            self.records.lock().push(record);
            Ok(())
        }
    }

    struct DownSink;

    impl AuditSink for DownSink {
        fn record(&self, _record: AuditRecord) -> core::result::Result<(), AuditSinkError> {
            Err(AuditSinkError::Unavailable("disk full".into()))
        }
    }

    fn identities(n: usize) -> Vec<VehicleIdentity> {
        let mut rng = ChaCha20Rng::seed_from_u64(77);
        (0..n)
            .map(|i| {
                VehicleIdentity::enroll(VehicleId::new(format!("veh-{i}")), &mut rng, 100).unwrap()
            })
            .collect()
    }

    #[test]
    fn derive_writes_audit_record() {
        let sink = Arc::new(MemorySink::default());
        let deriver = TaskKeyDeriver::new(sink.clone());
        let ids = identities(1);
        let task = TaskId::from("task-001");

        let key = deriver.derive(&ids[0], &task, 500).unwrap();

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vehicle_id, *ids[0].vehicle_id());
        assert_eq!(records[0].master_pk, *ids[0].master_pk());
        assert_eq!(records[0].derived_pk, *key.derived_pk());
        assert_eq!(records[0].link_tag, *key.link_tag());
        assert_eq!(records[0].timestamp, 500);
    }

    #[test]
    fn unavailable_sink_withholds_key() {
        let deriver = TaskKeyDeriver::new(Arc::new(DownSink));
        let ids = identities(1);
        let result = deriver.derive(&ids[0], &TaskId::from("task-001"), 0);
        assert!(matches!(
            result,
            Err(crate::Error::AuditSink(AuditSinkError::Unavailable(_)))
        ));
    }

    #[test]
    fn enroll_cohort_builds_ring_in_order() {
        let sink = Arc::new(MemorySink::default());
        let deriver = TaskKeyDeriver::new(sink.clone());
        let ids = identities(4);
        let task = TaskId::from("task-001");

        let (ring, keys) = deriver.enroll_cohort(&task, &ids, 1_000).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.task_id(), &task);
        assert_eq!(ring.creation_time(), 1_000);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(ring.index_of(key.derived_pk()).unwrap(), i);
        }
        assert_eq!(sink.records.lock().len(), 4);
    }
}

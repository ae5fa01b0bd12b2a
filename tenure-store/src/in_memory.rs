use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tenure_core::{LeaseRecord, LeaseStore, LeaseVersion, Result, TenureError, VersionedRecord};
use tracing::trace;

/// Simple in-memory lease store implementation.
///
/// Stores the lease record as serialized JSON guarded by a single mutex, so
/// version checks and writes are atomic with respect to each other. The
/// version counter advances on every successful write, including forced
/// overwrites. Suitable for tests and single-process scenarios; production
/// deployments back the [`LeaseStore`] trait with an external store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaseStore {
    cell: Arc<Mutex<Cell>>,
}

#[derive(Debug, Default)]
struct Cell {
    record: Option<Vec<u8>>,
    version: u64,
}

impl InMemoryLeaseStore {
    /// Create a new, empty in-memory lease store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn get(&self) -> Result<Option<VersionedRecord>> {
        let cell = self.cell.lock();
        match &cell.record {
            Some(bytes) => {
                let record: LeaseRecord =
                    serde_json::from_slice(bytes).map_err(|e| TenureError::RecordCorrupted {
                        details: e.to_string(),
                    })?;
                Ok(Some((record, LeaseVersion::new(cell.version))))
            }
            None => Ok(None),
        }
    }

    async fn compare_and_swap(
        &self,
        expected: Option<LeaseVersion>,
        record: LeaseRecord,
    ) -> Result<bool> {
        let bytes = serde_json::to_vec(&record)?;
        let mut cell = self.cell.lock();
        let matches = match (expected, &cell.record) {
            (None, None) => true,
            (Some(version), Some(_)) => version.value() == cell.version,
            _ => false,
        };
        if !matches {
            trace!(
                expected = ?expected,
                current = cell.version,
                "lease CAS lost"
            );
            return Ok(false);
        }
        cell.record = Some(bytes);
        cell.version += 1;
        Ok(true)
    }

    async fn force_set(&self, record: LeaseRecord) -> Result<LeaseVersion> {
        let bytes = serde_json::to_vec(&record)?;
        let mut cell = self.cell.lock();
        cell.record = Some(bytes);
        cell.version += 1;
        Ok(LeaseVersion::new(cell.version))
    }
}

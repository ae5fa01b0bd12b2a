//! Lease store abstraction consumed by the elector.
//!
//! The store is an external collaborator holding the lease record at a
//! well-known key, with at-least linearizable read-after-write-on-success
//! semantics for that key. Tenure does not replicate the store; it only
//! requires `get` and a versioned compare-and-swap.

use crate::{LeaseRecord, LeaseVersion, Result};
use async_trait::async_trait;

/// A versioned read of the lease record.
pub type VersionedRecord = (LeaseRecord, LeaseVersion);

/// Key/value store holding the shared lease record.
///
/// All mutation goes through [`compare_and_swap`](LeaseStore::compare_and_swap);
/// the single exception is [`force_set`](LeaseStore::force_set), the
/// recovery path taken when the record cannot be read at all.
///
/// # Returns
///
/// * `get`: `Ok(Some((record, version)))` when a record exists,
///   `Ok(None)` when the key is absent, `Err` when the store is
///   unreachable or the value undecodable.
/// * `compare_and_swap`: `Ok(true)` when the write landed, `Ok(false)` when
///   the expected version no longer matched (a lost race, not an error).
///   `expected = None` means create-if-absent.
/// * `force_set`: the version assigned to the overwritten record.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    async fn get(&self) -> Result<Option<VersionedRecord>>;

    async fn compare_and_swap(
        &self,
        expected: Option<LeaseVersion>,
        record: LeaseRecord,
    ) -> Result<bool>;

    async fn force_set(&self, record: LeaseRecord) -> Result<LeaseVersion>;
}

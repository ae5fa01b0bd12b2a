//! Fault-injecting lease store wrapper.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tenure_core::{LeaseRecord, LeaseStore, LeaseVersion, Result, TenureError, VersionedRecord};

/// Wraps a [`LeaseStore`] and fails reads and/or writes on demand.
///
/// Used to exercise the elector's forced-overwrite recovery and the
/// client's discovery retries without a real failing backend.
#[derive(Clone)]
pub struct FlakyLeaseStore<S> {
    inner: S,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    read_failures: Arc<AtomicU64>,
    write_failures: Arc<AtomicU64>,
}

impl<S: LeaseStore> FlakyLeaseStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            read_failures: Arc::new(AtomicU64::new(0)),
            write_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::SeqCst)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: LeaseStore> LeaseStore for FlakyLeaseStore<S> {
    async fn get(&self) -> Result<Option<VersionedRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            self.read_failures.fetch_add(1, Ordering::SeqCst);
            return Err(TenureError::store_unavailable("injected read failure"));
        }
        self.inner.get().await
    }

    async fn compare_and_swap(
        &self,
        expected: Option<LeaseVersion>,
        record: LeaseRecord,
    ) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            self.write_failures.fetch_add(1, Ordering::SeqCst);
            return Err(TenureError::store_unavailable("injected write failure"));
        }
        self.inner.compare_and_swap(expected, record).await
    }

    async fn force_set(&self, record: LeaseRecord) -> Result<LeaseVersion> {
        // Forced overwrites go through even when CAS writes fail, matching
        // a backend whose conditional-update path is the broken one.
        self.inner.force_set(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::CandidateId;
    use tenure_store::InMemoryLeaseStore;

    #[tokio::test]
    async fn test_injected_read_failures_count() {
        let store = FlakyLeaseStore::new(InMemoryLeaseStore::new());
        assert!(store.get().await.unwrap().is_none());

        store.fail_reads(true);
        assert!(store.get().await.is_err());
        assert!(store.get().await.is_err());
        assert_eq!(store.read_failures(), 2);

        store.fail_reads(false);
        assert!(store.get().await.is_ok());
    }

    #[tokio::test]
    async fn test_force_set_bypasses_write_injection() {
        let store = FlakyLeaseStore::new(InMemoryLeaseStore::new());
        store.fail_writes(true);

        let record = LeaseRecord::acquired(CandidateId::new("a"), 15_000, 0, 0);
        assert!(store.compare_and_swap(None, record.clone()).await.is_err());
        assert!(store.force_set(record).await.is_ok());
        assert!(store.get().await.unwrap().is_some());
    }
}

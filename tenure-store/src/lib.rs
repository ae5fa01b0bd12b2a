//! # Tenure Store
//!
//! Lease store implementations for the Tenure coordination framework.
//!
//! This crate provides concrete backends for the `LeaseStore` trait, which
//! holds exactly one versioned lease record and mutates it only through
//! compare-and-swap.
//!
//! ## Implementations
//!
//! - [`InMemoryLeaseStore`] - record kept in memory (tests, single process)
//!
//! ## Example
//!
//! ```rust
//! use tenure_core::{CandidateId, LeaseRecord, LeaseStore};
//! use tenure_store::InMemoryLeaseStore;
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryLeaseStore::new();
//! let record = LeaseRecord::acquired(CandidateId::new("node-1"), 15_000, 0, 1);
//! assert!(store.compare_and_swap(None, record).await.unwrap());
//!
//! let (stored, _version) = store.get().await.unwrap().unwrap();
//! assert_eq!(stored.holder_identity, CandidateId::new("node-1"));
//! # });
//! ```

pub mod in_memory;

pub use in_memory::InMemoryLeaseStore;

//! # Tenure Core - Coordination Substrate Types
//!
//! Core components for the Tenure coordination framework: lease-based
//! leader election over an external compare-and-swap record store, and
//! leader-following clients that retry idempotent actions against whichever
//! process currently holds the role.
//!
//! This crate provides the pieces shared by electors, clients, and stores:
//!
//! - **Lease Types**: [`CandidateId`], [`LeaseRecord`], [`LeaseVersion`]
//! - **LeaseStore Trait**: the CAS store seam an elector runs against
//! - **Retry Policies**: bounded, jittered backoff with pluggable schedules
//! - **Clock Abstraction**: injectable time source for validity checks
//! - **Error Handling**: the [`TenureError`] taxonomy and retryability
//!
//! ## Running an election
//!
//! ```rust,ignore
//! use tenure_core::{CandidateId, LeaseStore};
//! use tenure_elector::{ElectionConfig, LeaderElector, LeadershipHooks};
//!
//! let elector = LeaderElector::new(
//!     CandidateId::new("worker-1:8090"),
//!     store,
//!     ElectionConfig::default(),
//! );
//! elector.run(LeadershipHooks::new(
//!     || println!("started leading"),
//!     || println!("stopped leading"),
//! )).await;
//! ```
//!
//! The elector maintains the shared lease record through CAS writes only;
//! clients discover the current holder through the same record and follow
//! it across handovers.

pub mod clock;
pub mod error;
pub mod lease;
pub mod retry;
pub mod types;

// Re-export commonly used types for convenience
pub use clock::{Clock, SystemClock};
pub use error::{Result, TenureError};
pub use lease::{LeaseStore, VersionedRecord};
pub use retry::{GaussianJitter, JitterSource, NoJitter, RetryPolicy, RetryState};
pub use types::{CandidateId, LeaseRecord, LeaseVersion};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_record_is_eligible_for_takeover() {
        let record = LeaseRecord::acquired(CandidateId::new("a"), 15_000, 0, 1);
        assert!(!record.is_valid(15_000));
        assert!(record.is_held_by(&CandidateId::new("a")));
        assert!(!record.is_held_by(&CandidateId::new("b")));
    }

    #[test]
    fn test_error_types() {
        let error = TenureError::transport("connection reset by peer");
        assert!(error.is_retryable());

        let error = TenureError::RetryExhausted { attempts: 3 };
        assert!(!error.is_retryable());
    }
}

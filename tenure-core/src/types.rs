//! # Core Types
//!
//! Fundamental types used throughout the Tenure coordination framework.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a candidate process in a leader election.
///
/// Every process participating in an election carries a unique identity
/// string. The identity is what gets written into the lease record as the
/// holder, and under identity-based discovery it doubles as the candidate's
/// network address.
///
/// # Examples
///
/// ```rust
/// use tenure_core::CandidateId;
///
/// let id = CandidateId::new("coordinator-7f3a:8090");
/// assert_eq!(id.as_str(), "coordinator-7f3a:8090");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    /// Creates a candidate identity from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// CAS version of the stored lease record.
///
/// The lease store assigns a new version on every successful write; a
/// compare-and-swap succeeds only when the caller's expected version still
/// matches the stored one.
///
/// # Examples
///
/// ```rust
/// use tenure_core::LeaseVersion;
///
/// let v1 = LeaseVersion::new(1);
/// let v2 = v1.next();
/// assert!(v2 > v1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeaseVersion(pub u64);

impl LeaseVersion {
    /// Creates a version with the given value.
    pub fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the numeric version value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the successor version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LeaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The shared lease record persisted at the election's well-known key.
///
/// The record is the single cross-process shared mutable resource of the
/// system. Its only legal mutation path is a compare-and-swap against an
/// expected version; the one exception is the forced-overwrite recovery
/// path the elector takes when the record cannot be read at all.
///
/// All timestamps are unix epoch milliseconds, matching what the
/// coordinating processes exchange on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Identity of the candidate currently holding the lease.
    pub holder_identity: CandidateId,

    /// How long a renewal keeps the lease valid, in milliseconds.
    pub lease_duration_ms: u64,

    /// When the current holder first acquired the lease.
    pub acquire_time_ms: u64,

    /// When the current holder last renewed the lease.
    pub renew_time_ms: u64,

    /// Number of leadership handovers observed on this record.
    pub leader_transitions: u64,

    /// Opaque metadata attached by the holder (deployment labels, etc.).
    pub owner_metadata: Option<String>,
}

impl LeaseRecord {
    /// Creates a freshly-acquired record held by `holder` as of `now_ms`.
    pub fn acquired(
        holder: CandidateId,
        lease_duration_ms: u64,
        now_ms: u64,
        leader_transitions: u64,
    ) -> Self {
        Self {
            holder_identity: holder,
            lease_duration_ms,
            acquire_time_ms: now_ms,
            renew_time_ms: now_ms,
            leader_transitions,
            owner_metadata: None,
        }
    }

    /// A record is valid while the last renewal is younger than the lease
    /// duration. An expired record is eligible for takeover by any
    /// candidate.
    pub fn is_valid(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.renew_time_ms) < self.lease_duration_ms
    }

    /// Returns a copy of this record with only the renew time moved
    /// forward, preserving acquire time and transition count.
    pub fn renewed(&self, now_ms: u64) -> Self {
        Self {
            renew_time_ms: now_ms,
            ..self.clone()
        }
    }

    /// True when `candidate` is the recorded holder.
    pub fn is_held_by(&self, candidate: &CandidateId) -> bool {
        &self.holder_identity == candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_validity_window() {
        let record = LeaseRecord::acquired(CandidateId::new("a"), 15_000, 1_000, 1);
        assert!(record.is_valid(1_000));
        assert!(record.is_valid(15_999));
        assert!(!record.is_valid(16_000));
    }

    #[test]
    fn test_renewed_preserves_acquire_time() {
        let record = LeaseRecord::acquired(CandidateId::new("a"), 15_000, 1_000, 3);
        let renewed = record.renewed(9_000);
        assert_eq!(renewed.acquire_time_ms, 1_000);
        assert_eq!(renewed.renew_time_ms, 9_000);
        assert_eq!(renewed.leader_transitions, 3);
        assert!(renewed.is_valid(20_000));
    }

    #[test]
    fn test_record_round_trips_as_json() {
        let record = LeaseRecord::acquired(CandidateId::new("node-1:8080"), 15_000, 42, 7);
        let json = serde_json::to_string(&record).unwrap();
        let back: LeaseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_validity_is_not_confused_by_clock_skew() {
        // A renew time in the future must not underflow the age check.
        let record = LeaseRecord::acquired(CandidateId::new("a"), 15_000, 10_000, 1);
        assert!(record.is_valid(5_000));
    }
}

//! # Error Types
//!
//! Error taxonomy for the Tenure coordination framework.

use thiserror::Error;

/// Error types that can occur while electing a leader or submitting
/// actions to one.
///
/// Lease contention deliberately has no variant here: losing a CAS race is
/// the normal non-leader state and is reported as `Ok(false)` by the store,
/// never as an error. Everything below is either absorbed internally
/// (store hiccups, transient transport faults) or surfaced to the caller
/// (fatal request failures, retry exhaustion, cancellation).
///
/// # Examples
///
/// ```rust
/// use tenure_core::TenureError;
///
/// let error = TenureError::store_unavailable("connection refused");
/// assert!(error.is_retryable());
/// ```
#[derive(Error, Debug)]
pub enum TenureError {
    /// The lease store could not serve a read or write.
    ///
    /// While the elector is running this triggers the forced-overwrite
    /// recovery path rather than being surfaced.
    #[error("Lease store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The stored lease record exists but cannot be decoded.
    #[error("Lease record corrupted: {details}")]
    RecordCorrupted { details: String },

    /// A transient transport fault (timeout, reset connection, 5xx).
    /// Retried by the action client.
    #[error("Transient transport failure: {message}")]
    Transport { message: String },

    /// A fatal request failure (handshake, protocol violation, 4xx).
    /// Surfaced immediately; retrying cannot succeed without external
    /// intervention.
    #[error("Fatal request failure: {message}")]
    FatalResponse { message: String },

    /// The configured retry budget ran out before any attempt succeeded.
    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// The caller-supplied cancellation signal fired mid-operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// No leader is currently resolvable, a transient condition during
    /// elections and handovers. Retried by the action client.
    #[error("Leader unresolved: {message}")]
    LeaderUnresolved { message: String },

    /// A configuration invariant was violated.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// JSON serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results in the Tenure coordination framework.
pub type Result<T> = std::result::Result<T, TenureError>;

impl TenureError {
    /// Creates a new store-unavailable error with the given message.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new transient transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new fatal response error with the given message.
    pub fn fatal_response(message: impl Into<String>) -> Self {
        Self::FatalResponse {
            message: message.into(),
        }
    }

    /// Creates a new unresolved-leader error with the given message.
    pub fn leader_unresolved(message: impl Into<String>) -> Self {
        Self::LeaderUnresolved {
            message: message.into(),
        }
    }

    /// Creates a new invalid-configuration error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Creates a new internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Determines if this error condition is potentially recoverable by
    /// retrying.
    ///
    /// Retryable errors are transient conditions: an unreachable store, a
    /// transient transport fault, an unresolved leader mid-failover.
    /// Non-retryable errors indicate definitive failures the caller must
    /// handle.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::Transport { .. } | Self::LeaderUnresolved { .. }
        )
    }
}

impl From<anyhow::Error> for TenureError {
    fn from(err: anyhow::Error) -> Self {
        TenureError::Internal {
            message: err.to_string(),
        }
    }
}

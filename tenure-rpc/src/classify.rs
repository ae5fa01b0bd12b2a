//! Transport fault classification.
//!
//! Maps completed or failed RPC attempts onto the retry decision the action
//! client consumes: timeouts, reset connections, and 5xx responses are
//! worth retrying; handshake failures, protocol violations, and 4xx
//! responses cannot succeed without external intervention.

use crate::RpcOutcome;
use bytes::Bytes;
use std::fmt;

/// The failure families a classified RPC attempt can fall into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFault {
    /// No response within the configured read/connect timeout.
    Timeout,
    /// Peer closed the connection before a well-formed response line.
    ConnectionReset,
    /// TLS negotiation failure.
    HandshakeFailure,
    /// Response unparseable as the expected protocol, or a status the
    /// action endpoint never legitimately produces.
    ProtocolViolation,
    /// HTTP-style status in [500, 599].
    ServerError(u16),
    /// HTTP-style status in [400, 499].
    ClientError(u16),
}

impl TransportFault {
    /// Whether retrying an attempt that failed this way can ever succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionReset | Self::ServerError(_)
        )
    }
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionReset => write!(f, "connection reset"),
            Self::HandshakeFailure => write!(f, "handshake failure"),
            Self::ProtocolViolation => write!(f, "protocol violation"),
            Self::ServerError(status) => write!(f, "server error (status {status})"),
            Self::ClientError(status) => write!(f, "client error (status {status})"),
        }
    }
}

/// Verdict of classifying one RPC attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 2xx response; carries the body for decoding.
    Success(Bytes),
    /// Transient failure; consult the retry policy.
    Retryable(TransportFault),
    /// Definitive failure; surface immediately, never retry.
    Fatal(TransportFault),
}

/// Classifies a completed or failed RPC attempt.
///
/// Statuses outside the 2xx/4xx/5xx families (1xx, 3xx) are treated as
/// protocol violations: the action endpoint never redirects, so following
/// or retrying such a response cannot succeed.
pub fn classify(outcome: RpcOutcome) -> Verdict {
    match outcome {
        RpcOutcome::Response { status, body } => match status {
            200..=299 => Verdict::Success(body),
            500..=599 => Verdict::Retryable(TransportFault::ServerError(status)),
            400..=499 => Verdict::Fatal(TransportFault::ClientError(status)),
            _ => Verdict::Fatal(TransportFault::ProtocolViolation),
        },
        RpcOutcome::TimedOut => Verdict::Retryable(TransportFault::Timeout),
        RpcOutcome::ConnectionReset => Verdict::Retryable(TransportFault::ConnectionReset),
        RpcOutcome::HandshakeFailed { .. } => Verdict::Fatal(TransportFault::HandshakeFailure),
        RpcOutcome::Malformed { .. } => Verdict::Fatal(TransportFault::ProtocolViolation),
    }
}

//! Transport abstraction for leader RPCs.
//!
//! The byte-level framing of the wire protocol is an external collaborator;
//! this module only defines the seam the action client issues requests
//! through and the outcome shape the fault classifier consumes.

use crate::{ActionEnvelope, Endpoint};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The observed result of one RPC attempt.
///
/// Transport failures are modeled as outcomes rather than errors so every
/// attempt flows through the same classification path.
#[derive(Debug, Clone)]
pub enum RpcOutcome {
    /// A well-formed response line with status and body arrived.
    Response { status: u16, body: Bytes },

    /// No response within the configured connect/read timeout.
    TimedOut,

    /// The peer closed the connection before a well-formed response line.
    ConnectionReset,

    /// TLS negotiation failed (untrusted certificate, name mismatch,
    /// protocol mismatch).
    HandshakeFailed { reason: String },

    /// The response could not be parsed as the expected protocol.
    Malformed { detail: String },
}

impl RpcOutcome {
    /// A 2xx response carrying the given body.
    pub fn ok(body: Bytes) -> Self {
        Self::Response { status: 200, body }
    }

    /// A response with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        Self::Response {
            status,
            body: Bytes::new(),
        }
    }
}

/// Channel the action client submits envelopes through.
///
/// `send` never fails at the Rust level; every failure mode is an
/// [`RpcOutcome`] for the classifier. Implementations apply the per-attempt
/// timeouts and proxy settings from [`TransportConfig`] uniformly.
#[async_trait]
pub trait ActionTransport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint, envelope: &ActionEnvelope) -> RpcOutcome;
}

/// Forward-proxy settings applied to all leader RPCs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Username/password pair, when the proxy requires authentication.
    pub credentials: Option<(String, String)>,
}

/// Per-attempt transport configuration.
///
/// These timeouts are independent from the overall retry budget: each
/// attempt gets the full connect/read/handshake allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Timeout for reading a complete response.
    pub read_timeout: Duration,
    /// Timeout for the TLS handshake, where one happens.
    pub handshake_timeout: Duration,
    /// Optional forward proxy for all leader RPCs.
    pub proxy: Option<ProxyConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

impl TransportConfig {
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

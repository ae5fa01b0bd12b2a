//! Wire envelopes for the single action endpoint a leader exposes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tenure_core::Result;
use uuid::Uuid;

/// Network endpoint of a leader's action surface.
///
/// Opaque to this crate; concrete transports interpret it (host:port, URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(pub String);

impl Endpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

/// A serialized action plus its caller-assigned idempotency token.
///
/// The token stays stable across retries of the same logical action so a
/// leader that already applied an earlier attempt's effects does not apply
/// them again. Retried submission is therefore safe to repeat at the
/// network layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub action: Value,
    pub idempotency_token: Uuid,
}

impl ActionEnvelope {
    /// Wraps an action payload with a fresh idempotency token.
    pub fn new(action: Value) -> Self {
        Self {
            action,
            idempotency_token: Uuid::new_v4(),
        }
    }

    /// Serializes the envelope into request-body bytes.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decodes an envelope from request-body bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Success envelope returned by the leader with a 2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub result: Value,
}

impl ResultEnvelope {
    pub fn new(result: Value) -> Self {
        Self { result }
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

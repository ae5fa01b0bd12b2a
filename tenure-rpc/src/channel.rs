//! In-process action transport.
//!
//! Routes envelopes to handlers registered per endpoint, standing in for
//! the external wire transport in tests and single-process deployments.
//! The leader-side handler wrapper applies each idempotency token at most
//! once, caching the first successful result for redelivery.

use crate::{ActionEnvelope, ActionTransport, Endpoint, ResultEnvelope, RpcOutcome, TransportConfig};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

/// Leader-side handler for the single action endpoint.
///
/// Returns the result payload on success, or an HTTP-style status code the
/// transport reports to the caller (the classifier decides whether that
/// status is worth retrying).
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, action: Value) -> std::result::Result<Value, u16>;
}

#[async_trait]
impl<F> ActionHandler for F
where
    F: Fn(Value) -> std::result::Result<Value, u16> + Send + Sync,
{
    async fn handle(&self, action: Value) -> std::result::Result<Value, u16> {
        (self)(action)
    }
}

/// Wraps an [`ActionHandler`] with exactly-once effect application keyed on
/// the idempotency token.
///
/// The first successful result for a token is cached and replayed for any
/// redelivery; failed attempts are not cached, so a retried delivery gets a
/// fresh chance to apply.
pub struct IdempotentHandler {
    inner: Arc<dyn ActionHandler>,
    applied: DashMap<Uuid, Value>,
}

impl IdempotentHandler {
    pub fn new(inner: Arc<dyn ActionHandler>) -> Self {
        Self {
            inner,
            applied: DashMap::new(),
        }
    }

    /// Handles one delivery of an envelope, deduplicating by token.
    pub async fn handle_envelope(
        &self,
        envelope: &ActionEnvelope,
    ) -> std::result::Result<Value, u16> {
        if let Some(cached) = self.applied.get(&envelope.idempotency_token) {
            debug!(
                token = %envelope.idempotency_token,
                "replaying cached result for redelivered action"
            );
            return Ok(cached.clone());
        }
        let result = self.inner.handle(envelope.action.clone()).await?;
        self.applied
            .insert(envelope.idempotency_token, result.clone());
        Ok(result)
    }

    /// Number of distinct tokens applied so far.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// In-process transport connecting clients to registered leader endpoints.
///
/// An envelope sent to an unregistered endpoint observes a connection
/// reset, exactly what a follower sees when the old leader's socket is
/// gone. Handler execution is bounded by the configured read timeout.
#[derive(Clone)]
pub struct ChannelTransport {
    routes: Arc<DashMap<Endpoint, Arc<IdempotentHandler>>>,
    config: TransportConfig,
}

impl ChannelTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            routes: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Registers a handler as the action surface at `endpoint`.
    pub fn register(&self, endpoint: Endpoint, handler: Arc<dyn ActionHandler>) {
        self.routes
            .insert(endpoint, Arc::new(IdempotentHandler::new(handler)));
    }

    /// Removes the handler at `endpoint`; subsequent sends observe resets.
    pub fn unregister(&self, endpoint: &Endpoint) {
        self.routes.remove(endpoint);
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl ActionTransport for ChannelTransport {
    async fn send(&self, endpoint: &Endpoint, envelope: &ActionEnvelope) -> RpcOutcome {
        let handler = match self.routes.get(endpoint) {
            Some(handler) => Arc::clone(&handler),
            None => {
                warn!(%endpoint, "no action surface registered at endpoint");
                return RpcOutcome::ConnectionReset;
            }
        };

        match timeout(self.config.read_timeout, handler.handle_envelope(envelope)).await {
            Ok(Ok(result)) => match ResultEnvelope::new(result).to_bytes() {
                Ok(body) => RpcOutcome::ok(body),
                Err(e) => RpcOutcome::Malformed {
                    detail: e.to_string(),
                },
            },
            Ok(Err(status)) => RpcOutcome::status(status),
            Err(_) => RpcOutcome::TimedOut,
        }
    }
}

//! Scripted transport for driving the action client through exact
//! failure sequences.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tenure_rpc::{ActionEnvelope, ActionTransport, Endpoint, ResultEnvelope, RpcOutcome};
use uuid::Uuid;

/// Replays a queue of outcomes, one per send, recording where each
/// attempt was targeted.
///
/// Once the script runs dry every further send observes the fallback
/// outcome (a 200 with an empty-object result unless overridden).
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<RpcOutcome>>>,
    sent: Arc<Mutex<Vec<(Endpoint, Uuid)>>>,
    fallback: Arc<Mutex<RpcOutcome>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        let body = ResultEnvelope::new(Value::Object(Default::default()))
            .to_bytes()
            .unwrap_or_else(|_| Bytes::new());
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            fallback: Arc::new(Mutex::new(RpcOutcome::ok(body))),
        }
    }

    /// Appends one outcome to the script.
    pub fn push(&self, outcome: RpcOutcome) -> &Self {
        self.script.lock().push_back(outcome);
        self
    }

    /// Appends a 200 response carrying `result` in a success envelope.
    pub fn push_success(&self, result: Value) -> &Self {
        let body = ResultEnvelope::new(result)
            .to_bytes()
            .expect("result envelope serializes");
        self.push(RpcOutcome::ok(body))
    }

    /// Replaces the outcome observed after the script is exhausted.
    pub fn set_fallback(&self, outcome: RpcOutcome) {
        *self.fallback.lock() = outcome;
    }

    /// Endpoints targeted so far, in order.
    pub fn targets(&self) -> Vec<Endpoint> {
        self.sent.lock().iter().map(|(e, _)| e.clone()).collect()
    }

    /// Idempotency tokens observed so far, in order.
    pub fn tokens(&self) -> Vec<Uuid> {
        self.sent.lock().iter().map(|(_, t)| *t).collect()
    }

    /// Number of sends observed.
    pub fn attempts(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionTransport for ScriptedTransport {
    async fn send(&self, endpoint: &Endpoint, envelope: &ActionEnvelope) -> RpcOutcome {
        self.sent
            .lock()
            .push((endpoint.clone(), envelope.idempotency_token));
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.lock().clone())
    }
}

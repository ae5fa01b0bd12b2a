//! Leader-following resilient action client.
//!
//! `submit` re-resolves the leader's endpoint before every attempt rather
//! than caching it for the session: the leader may change between
//! attempts, and caching across more than a single attempt would
//! under-tolerate failover.

use crate::LeaderLocator;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tenure_core::{GaussianJitter, JitterSource, Result, RetryPolicy, RetryState, TenureError};
use tenure_rpc::{classify, ActionEnvelope, ActionTransport, Endpoint, ResultEnvelope, Verdict};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

type JitterFactory = Arc<dyn Fn() -> Box<dyn JitterSource> + Send + Sync>;

/// Submits idempotent actions to whichever process currently leads.
///
/// Each `submit` call owns an independent [`RetryState`] and jitter
/// source, so concurrent calls against one client share no mutable retry
/// state.
pub struct ActionClient<T, L> {
    transport: T,
    locator: L,
    retry_policy: RetryPolicy,
    jitter_factory: JitterFactory,
}

impl<T: ActionTransport, L: LeaderLocator> ActionClient<T, L> {
    pub fn new(transport: T, locator: L, retry_policy: RetryPolicy) -> Self {
        Self {
            transport,
            locator,
            retry_policy,
            jitter_factory: Arc::new(|| Box::new(GaussianJitter::from_entropy())),
        }
    }

    /// Replaces the per-call jitter source, e.g. with
    /// [`NoJitter`](tenure_core::NoJitter) for deterministic tests.
    pub fn with_jitter_factory(
        mut self,
        factory: impl Fn() -> Box<dyn JitterSource> + Send + Sync + 'static,
    ) -> Self {
        self.jitter_factory = Arc::new(factory);
        self
    }

    /// Submits one logical action and returns its decoded result.
    ///
    /// The action gets a fresh idempotency token that stays stable across
    /// every retry of this call, so the leader applies its effects at most
    /// once however many deliveries happen.
    pub async fn submit<A, R>(&self, action: &A) -> Result<R>
    where
        A: Serialize + Sync,
        R: DeserializeOwned,
    {
        // Held open for the duration of the call so cancellation stays
        // pending rather than closed.
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.submit_with_cancel(action, cancel_rx).await
    }

    /// Like [`submit`](ActionClient::submit), but interruptible: when the
    /// watch flips to `true`, an in-progress sleep or in-flight RPC is
    /// abandoned and the call returns [`TenureError::Cancelled`] promptly.
    pub async fn submit_with_cancel<A, R>(
        &self,
        action: &A,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<R>
    where
        A: Serialize + Sync,
        R: DeserializeOwned,
    {
        let envelope = ActionEnvelope::new(serde_json::to_value(action)?);
        let mut state = RetryState::new();
        let mut jitter = (self.jitter_factory)();
        debug!(token = %envelope.idempotency_token, "submitting action");

        loop {
            if *cancel.borrow() {
                return Err(TenureError::Cancelled);
            }

            let attempt = self.attempt(&envelope, &mut cancel).await?;
            let failure = match attempt {
                AttemptOutcome::Success(body) => {
                    let result: ResultEnvelope = ResultEnvelope::from_bytes(&body)
                        .map_err(|e| TenureError::fatal_response(format!(
                            "protocol violation: undecodable success envelope: {e}"
                        )))?;
                    return Ok(serde_json::from_value(result.result)?);
                }
                AttemptOutcome::Retry(reason) => reason,
            };

            match self.retry_policy.next_delay(&mut state, jitter.as_mut()) {
                Some(delay) => {
                    warn!(
                        token = %envelope.idempotency_token,
                        attempt = state.attempt,
                        %failure,
                        "action attempt failed, will try again in {delay:?}"
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = cancelled(&mut cancel) => return Err(TenureError::Cancelled),
                    }
                }
                None => {
                    warn!(
                        token = %envelope.idempotency_token,
                        attempts = state.attempt,
                        %failure,
                        "retry budget exhausted"
                    );
                    return Err(TenureError::RetryExhausted {
                        attempts: state.attempt,
                    });
                }
            }
        }
    }

    /// One resolve-and-send attempt. Fatal classifications come back as
    /// `Err` and end the submission; retryable ones as `Retry`.
    async fn attempt(
        &self,
        envelope: &ActionEnvelope,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<AttemptOutcome> {
        let endpoint = match self.locator.locate().await {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                return Ok(AttemptOutcome::Retry(TenureError::leader_unresolved(
                    "no current leader in the lease record",
                )));
            }
            Err(error) => {
                return Ok(AttemptOutcome::Retry(error));
            }
        };

        debug!(token = %envelope.idempotency_token, %endpoint, "sending action to leader");
        let outcome = tokio::select! {
            outcome = self.transport.send(&endpoint, envelope) => outcome,
            _ = cancelled(cancel) => return Err(TenureError::Cancelled),
        };

        match classify(outcome) {
            Verdict::Success(body) => Ok(AttemptOutcome::Success(body)),
            Verdict::Retryable(fault) => {
                Ok(AttemptOutcome::Retry(TenureError::transport(fault.to_string())))
            }
            Verdict::Fatal(fault) => Err(TenureError::fatal_response(format!(
                "{fault} from {endpoint}"
            ))),
        }
    }

    /// The endpoint the next attempt would target, if a leader resolves.
    pub async fn current_target(&self) -> Result<Option<Endpoint>> {
        self.locator.locate().await
    }
}

enum AttemptOutcome {
    Success(bytes::Bytes),
    Retry(TenureError),
}

/// Resolves when the cancellation watch flips to true; a closed channel
/// can never signal cancellation and stays pending forever.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdentityResolver, StoreLocator};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tenure_core::{CandidateId, Clock, LeaseRecord, LeaseStore, NoJitter};
    use tenure_rpc::{ActionHandler, ChannelTransport};
    use tenure_store::InMemoryLeaseStore;

    #[derive(Clone, Copy)]
    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_unix_millis(&self) -> u64 {
            self.0
        }
    }

    async fn store_with_leader(holder: &str) -> InMemoryLeaseStore {
        let store = InMemoryLeaseStore::new();
        let record = LeaseRecord::acquired(CandidateId::new(holder), 15_000, 0, 1);
        store.compare_and_swap(None, record).await.unwrap();
        store
    }

    fn client(
        transport: ChannelTransport,
        store: InMemoryLeaseStore,
        policy: RetryPolicy,
    ) -> ActionClient<ChannelTransport, StoreLocator<InMemoryLeaseStore, IdentityResolver, FixedClock>>
    {
        let locator = StoreLocator::with_clock(store, IdentityResolver, FixedClock(0));
        ActionClient::new(transport, locator, policy).with_jitter_factory(|| Box::new(NoJitter))
    }

    struct Counting {
        calls: Arc<AtomicU32>,
        status: Option<u16>,
    }

    #[async_trait::async_trait]
    impl ActionHandler for Counting {
        async fn handle(&self, action: Value) -> std::result::Result<Value, u16> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.status {
                Some(status) => Err(status),
                None => Ok(json!({ "echo": action })),
            }
        }
    }

    #[tokio::test]
    async fn test_immediate_success_makes_one_call() {
        let store = store_with_leader("leader-a:1").await;
        let transport = ChannelTransport::default();
        let calls = Arc::new(AtomicU32::new(0));
        transport.register(
            Endpoint::new("leader-a:1"),
            Arc::new(Counting {
                calls: Arc::clone(&calls),
                status: None,
            }),
        );

        let client = client(transport, store, RetryPolicy::fixed(Duration::from_millis(100)));
        let result: Value = client.submit(&json!("ping")).await.unwrap();

        assert_eq!(result, json!({ "echo": "ping" }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_exhaust_the_budget() {
        let store = store_with_leader("leader-a:1").await;
        let transport = ChannelTransport::default();
        let calls = Arc::new(AtomicU32::new(0));
        transport.register(
            Endpoint::new("leader-a:1"),
            Arc::new(Counting {
                calls: Arc::clone(&calls),
                status: Some(503),
            }),
        );

        let policy = RetryPolicy::fixed(Duration::from_millis(100)).with_max_attempts(3);
        let client = client(transport, store, policy);
        let error = client.submit::<_, Value>(&json!("ping")).await.unwrap_err();

        assert!(matches!(error, TenureError::RetryExhausted { attempts: 3 }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let store = store_with_leader("leader-a:1").await;
        let transport = ChannelTransport::default();
        let calls = Arc::new(AtomicU32::new(0));
        transport.register(
            Endpoint::new("leader-a:1"),
            Arc::new(Counting {
                calls: Arc::clone(&calls),
                status: Some(400),
            }),
        );

        let policy = RetryPolicy::fixed(Duration::from_millis(100)).with_max_attempts(5);
        let client = client(transport, store, policy);
        let error = client.submit::<_, Value>(&json!("ping")).await.unwrap_err();

        assert!(matches!(error, TenureError::FatalResponse { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_retry_sleep() {
        // No leader resolvable: every attempt is retryable, so the call
        // would otherwise sleep through an unbounded budget.
        let store = InMemoryLeaseStore::new();
        let transport = ChannelTransport::default();
        let client = client(
            transport,
            store,
            RetryPolicy::fixed(Duration::from_secs(3600)),
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let submission =
            tokio::spawn(
                async move { client.submit_with_cancel::<_, Value>(&json!("x"), cancel_rx).await },
            );

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel_tx.send(true).unwrap();

        let error = submission.await.unwrap().unwrap_err();
        assert!(matches!(error, TenureError::Cancelled));
    }

    #[tokio::test]
    async fn test_missing_leader_is_retryable_until_exhaustion() {
        let store = InMemoryLeaseStore::new();
        let transport = ChannelTransport::default();
        let policy = RetryPolicy::fixed(Duration::from_millis(1)).with_max_attempts(2);
        let client = client(transport, store.clone(), policy);

        let error = client.submit::<_, Value>(&json!("x")).await.unwrap_err();
        assert!(matches!(error, TenureError::RetryExhausted { attempts: 2 }));
    }
}

//! Lease-based leader elector.
//!
//! One elector runs per candidate process, continuously maintaining the
//! shared lease record through compare-and-swap writes. State moves
//! `Observing -> Leading -> Observing` in a loop until [`stop`] cancels it.

use crate::{ElectionConfig, LeadershipEvent, LeadershipEventBus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tenure_core::{
    CandidateId, Clock, LeaseRecord, LeaseStore, Result, SystemClock, TenureError,
};
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// The callback pair invoked on leadership transitions.
///
/// For a single elector the hooks run sequentially and never overlap: the
/// start hook runs on its own task (aborted if leadership ends first, so a
/// slow hook cannot wedge the election loop), and the stop hook runs
/// inline before the elector returns to observing.
#[derive(Clone)]
pub struct LeadershipHooks {
    on_start_leading: Arc<dyn Fn() + Send + Sync>,
    on_stop_leading: Arc<dyn Fn() + Send + Sync>,
}

impl LeadershipHooks {
    pub fn new(
        on_start_leading: impl Fn() + Send + Sync + 'static,
        on_stop_leading: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_start_leading: Arc::new(on_start_leading),
            on_stop_leading: Arc::new(on_stop_leading),
        }
    }

    /// Hooks that do nothing; useful when only the event bus is consumed.
    pub fn noop() -> Self {
        Self::new(|| {}, || {})
    }
}

impl std::fmt::Debug for LeadershipHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadershipHooks").finish_non_exhaustive()
    }
}

/// Counters describing an elector's activity.
#[derive(Debug, Default, Clone)]
pub struct ElectionStats {
    pub leaderships_gained: u64,
    pub leaderships_lost: u64,
    pub renewals: u64,
    pub contentions: u64,
    pub forced_overwrites: u64,
}

/// Owns one candidate's participation in a leader election.
///
/// The elector is the only writer of its local leading flag; the cached
/// last-observed record sits behind a mutex so [`current_leader`] is safe
/// to call concurrently with the election loop from other tasks.
///
/// [`current_leader`]: LeaderElector::current_leader
pub struct LeaderElector<S, C = SystemClock> {
    candidate: CandidateId,
    config: ElectionConfig,
    store: S,
    clock: C,
    observed: Mutex<Option<LeaseRecord>>,
    leading: AtomicBool,
    events: LeadershipEventBus,
    stats: Mutex<ElectionStats>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: LeaseStore> LeaderElector<S, SystemClock> {
    /// Creates an elector over the wall clock.
    pub fn new(candidate: CandidateId, store: S, config: ElectionConfig) -> Result<Self> {
        Self::with_clock(candidate, store, config, SystemClock)
    }
}

impl<S: LeaseStore, C: Clock> LeaderElector<S, C> {
    /// Creates an elector with an explicit time source.
    pub fn with_clock(
        candidate: CandidateId,
        store: S,
        config: ElectionConfig,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            candidate,
            config,
            store,
            clock,
            observed: Mutex::new(None),
            leading: AtomicBool::new(false),
            events: LeadershipEventBus::default(),
            stats: Mutex::new(ElectionStats::default()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn candidate(&self) -> &CandidateId {
        &self.candidate
    }

    /// Whether this elector currently believes itself leader.
    pub fn is_leading(&self) -> bool {
        self.leading.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> ElectionStats {
        self.stats.lock().clone()
    }

    /// Subscribes to leadership transitions.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LeadershipEvent> {
        self.events.subscribe()
    }

    /// Runs the election loop until [`stop`](LeaderElector::stop) cancels
    /// it, invoking the hooks exactly once per leadership transition.
    pub async fn run(&self, hooks: LeadershipHooks) -> Result<()> {
        info!(candidate = %self.candidate, "starting leader elector");
        let mut shutdown_rx = self.shutdown_rx.clone();
        if *shutdown_rx.borrow() {
            return Ok(());
        }

        loop {
            if !self.observe(&mut shutdown_rx).await {
                break;
            }

            self.leading.store(true, Ordering::SeqCst);
            self.stats.lock().leaderships_gained += 1;
            info!(candidate = %self.candidate, "acquired lease, started leading");
            self.events.publish(LeadershipEvent::BecameLeader {
                candidate: self.candidate.clone(),
                timestamp: self.clock.now_unix_millis(),
            });

            let start_hook = Arc::clone(&hooks.on_start_leading);
            let start_task = tokio::spawn(async move { (start_hook)() });

            let keep_running = self.lead(&mut shutdown_rx).await;

            start_task.abort();
            self.leading.store(false, Ordering::SeqCst);
            (hooks.on_stop_leading)();
            self.stats.lock().leaderships_lost += 1;
            warn!(candidate = %self.candidate, "stopped leading");
            self.events.publish(LeadershipEvent::LostLeadership {
                candidate: self.candidate.clone(),
                timestamp: self.clock.now_unix_millis(),
            });

            if !keep_running {
                break;
            }
        }

        info!(candidate = %self.candidate, "leader elector stopped");
        Ok(())
    }

    /// Cancels the election loop. Idempotent; a leading elector runs its
    /// stop hook before [`run`](LeaderElector::run) returns.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns the freshest known holder identity, or `None` when no
    /// record is known.
    ///
    /// Reads the store to refresh the cached record; when the store is
    /// unreachable the last cached holder is answered instead.
    pub async fn current_leader(&self) -> Option<CandidateId> {
        match self.store.get().await {
            Ok(Some((record, _))) => {
                self.note_observed(&record);
                Some(record.holder_identity)
            }
            Ok(None) => None,
            Err(error) => {
                debug!(candidate = %self.candidate, %error, "lease read failed, answering from cache");
                self.observed
                    .lock()
                    .as_ref()
                    .map(|record| record.holder_identity.clone())
            }
        }
    }

    /// One acquisition/renewal step against the store.
    ///
    /// * vacant or expired record: CAS-write a record holding the lease for
    ///   this candidate, bumping the transition count;
    /// * valid record held by this candidate: CAS-write a renewal moving
    ///   only the renew time;
    /// * valid record held by another: `Ok(false)`, silently; contention
    ///   is the normal non-leader state, not an error.
    ///
    /// Store failures bubble up for the forced-overwrite recovery path.
    pub async fn try_acquire_or_renew(&self) -> Result<bool> {
        let now = self.clock.now_unix_millis();

        match self.store.get().await? {
            None => {
                let record = LeaseRecord::acquired(
                    self.candidate.clone(),
                    self.config.lease_duration_ms(),
                    now,
                    1,
                );
                let created = self.store.compare_and_swap(None, record.clone()).await?;
                if created {
                    debug!(candidate = %self.candidate, "acquired vacant lease");
                    *self.observed.lock() = Some(record);
                } else {
                    self.stats.lock().contentions += 1;
                }
                Ok(created)
            }
            Some((record, version)) => {
                self.note_observed(&record);

                if record.is_valid(now) {
                    if !record.is_held_by(&self.candidate) {
                        return Ok(false);
                    }
                    let renewal = record.renewed(now);
                    let swapped = self
                        .store
                        .compare_and_swap(Some(version), renewal.clone())
                        .await?;
                    if swapped {
                        self.stats.lock().renewals += 1;
                        *self.observed.lock() = Some(renewal);
                    } else {
                        self.stats.lock().contentions += 1;
                    }
                    Ok(swapped)
                } else {
                    let takeover = LeaseRecord {
                        holder_identity: self.candidate.clone(),
                        lease_duration_ms: self.config.lease_duration_ms(),
                        acquire_time_ms: now,
                        renew_time_ms: now,
                        leader_transitions: record.leader_transitions + 1,
                        owner_metadata: None,
                    };
                    let swapped = self
                        .store
                        .compare_and_swap(Some(version), takeover.clone())
                        .await?;
                    if swapped {
                        debug!(
                            candidate = %self.candidate,
                            previous = %record.holder_identity,
                            "took over expired lease"
                        );
                        *self.observed.lock() = Some(takeover);
                    } else {
                        self.stats.lock().contentions += 1;
                    }
                    Ok(swapped)
                }
            }
        }
    }

    /// Observing loop: retries acquisition every `retry_period`.
    /// Returns `true` once the lease is acquired, `false` on shutdown.
    async fn observe(&self, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        let mut ticker = interval(self.config.retry_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.try_acquire_or_renew().await {
                        Ok(true) => return true,
                        Ok(false) => {}
                        Err(error) => self.recover_from_read_failure(error).await,
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return false;
                    }
                }
            }
        }
    }

    /// Leading loop: renews every `retry_period`. Returns `true` when
    /// leadership was lost (keep electing), `false` on shutdown.
    async fn lead(&self, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        let mut ticker = interval(self.config.retry_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_renewed = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.try_acquire_or_renew().await {
                        Ok(true) => {
                            last_renewed = Instant::now();
                        }
                        Ok(false) => {
                            let now = self.clock.now_unix_millis();
                            let usurped = self.observed.lock().as_ref().is_some_and(|record| {
                                record.is_valid(now) && !record.is_held_by(&self.candidate)
                            });
                            if usurped {
                                warn!(candidate = %self.candidate, "lease now held by another candidate");
                                return true;
                            }
                            if last_renewed.elapsed() >= self.config.renew_deadline {
                                warn!(candidate = %self.candidate, "renew deadline elapsed without a successful renewal");
                                return true;
                            }
                        }
                        Err(error) => {
                            self.recover_from_read_failure(error).await;
                            if last_renewed.elapsed() >= self.config.renew_deadline {
                                return true;
                            }
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return false;
                    }
                }
            }
        }
    }

    /// Unconditionally overwrites an unreadable lease record with a fresh
    /// one holding this candidate's identity and a reset generation.
    ///
    /// A readable-but-stuck record must not permanently block election, so
    /// this path trades strict mutual exclusion for liveness: two
    /// candidates hitting identical store failures can momentarily both
    /// write themselves in. The next tick acquires through the normal
    /// renew path.
    async fn recover_from_read_failure(&self, error: TenureError) {
        warn!(
            candidate = %self.candidate,
            %error,
            "lease record unreadable, overwriting to force a fresh election"
        );
        let now = self.clock.now_unix_millis();
        let record = LeaseRecord::acquired(
            self.candidate.clone(),
            self.config.lease_duration_ms(),
            now,
            0,
        );
        match self.store.force_set(record.clone()).await {
            Ok(version) => {
                self.stats.lock().forced_overwrites += 1;
                *self.observed.lock() = Some(record);
                debug!(candidate = %self.candidate, %version, "forced lease overwrite applied");
            }
            Err(error) => {
                error!(candidate = %self.candidate, %error, "failed to overwrite unreadable lease record");
            }
        }
    }

    /// Refreshes the cached record, announcing holder changes.
    fn note_observed(&self, record: &LeaseRecord) {
        let mut observed = self.observed.lock();
        let holder_changed = observed
            .as_ref()
            .map(|previous| previous.holder_identity != record.holder_identity)
            .unwrap_or(true);
        *observed = Some(record.clone());
        drop(observed);

        if holder_changed && !record.is_held_by(&self.candidate) {
            self.events.publish(LeadershipEvent::LeaderChanged {
                holder: record.holder_identity.clone(),
                timestamp: self.clock.now_unix_millis(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;
    use tenure_core::{LeaseVersion, VersionedRecord};
    use tenure_store::InMemoryLeaseStore;

    #[derive(Clone, Default)]
    struct TestClock(Arc<AtomicU64>);

    impl TestClock {
        fn advance(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn now_unix_millis(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn config() -> ElectionConfig {
        ElectionConfig::default()
            .with_lease_duration(Duration::from_secs(15))
            .with_renew_deadline(Duration::from_secs(10))
            .with_retry_period(Duration::from_secs(2))
    }

    fn elector(
        name: &str,
        store: InMemoryLeaseStore,
        clock: TestClock,
    ) -> LeaderElector<InMemoryLeaseStore, TestClock> {
        LeaderElector::with_clock(CandidateId::new(name), store, config(), clock).unwrap()
    }

    #[tokio::test]
    async fn test_acquires_vacant_lease() {
        let store = InMemoryLeaseStore::new();
        let elector = elector("a", store.clone(), TestClock::default());

        assert!(elector.try_acquire_or_renew().await.unwrap());

        let (record, _) = store.get().await.unwrap().unwrap();
        assert_eq!(record.holder_identity, CandidateId::new("a"));
        assert_eq!(record.leader_transitions, 1);
    }

    #[tokio::test]
    async fn test_renewal_moves_only_renew_time() {
        let store = InMemoryLeaseStore::new();
        let clock = TestClock::default();
        let elector = elector("a", store.clone(), clock.clone());

        assert!(elector.try_acquire_or_renew().await.unwrap());
        clock.advance(5_000);
        assert!(elector.try_acquire_or_renew().await.unwrap());

        let (record, _) = store.get().await.unwrap().unwrap();
        assert_eq!(record.acquire_time_ms, 0);
        assert_eq!(record.renew_time_ms, 5_000);
        assert_eq!(record.leader_transitions, 1);
        assert_eq!(elector.stats().renewals, 1);
    }

    #[tokio::test]
    async fn test_valid_lease_of_another_is_contention_not_error() {
        let store = InMemoryLeaseStore::new();
        let clock = TestClock::default();
        let holder = elector("a", store.clone(), clock.clone());
        let challenger = elector("b", store.clone(), clock.clone());

        assert!(holder.try_acquire_or_renew().await.unwrap());
        assert!(!challenger.try_acquire_or_renew().await.unwrap());
        assert_eq!(challenger.current_leader().await, Some(CandidateId::new("a")));
    }

    #[tokio::test]
    async fn test_takeover_of_expired_lease_bumps_transitions() {
        let store = InMemoryLeaseStore::new();
        let clock = TestClock::default();
        let holder = elector("a", store.clone(), clock.clone());
        let challenger = elector("b", store.clone(), clock.clone());

        assert!(holder.try_acquire_or_renew().await.unwrap());
        clock.advance(15_000); // lease_duration elapsed
        assert!(challenger.try_acquire_or_renew().await.unwrap());

        let (record, _) = store.get().await.unwrap().unwrap();
        assert_eq!(record.holder_identity, CandidateId::new("b"));
        assert_eq!(record.leader_transitions, 2);
    }

    #[derive(Clone, Default)]
    struct UnreadableStore {
        inner: InMemoryLeaseStore,
        readable: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LeaseStore for UnreadableStore {
        async fn get(&self) -> Result<Option<VersionedRecord>> {
            if self.readable.load(Ordering::SeqCst) {
                self.inner.get().await
            } else {
                Err(TenureError::store_unavailable("connection refused"))
            }
        }

        async fn compare_and_swap(
            &self,
            expected: Option<LeaseVersion>,
            record: LeaseRecord,
        ) -> Result<bool> {
            self.inner.compare_and_swap(expected, record).await
        }

        async fn force_set(&self, record: LeaseRecord) -> Result<LeaseVersion> {
            self.inner.force_set(record).await
        }
    }

    #[tokio::test]
    async fn test_read_failure_forces_overwrite() {
        let store = UnreadableStore::default();
        let clock = TestClock::default();
        let elector =
            LeaderElector::with_clock(CandidateId::new("a"), store.clone(), config(), clock)
                .unwrap();

        let error = elector.try_acquire_or_renew().await.unwrap_err();
        elector.recover_from_read_failure(error).await;

        let (record, _) = store.inner.get().await.unwrap().unwrap();
        assert_eq!(record.holder_identity, CandidateId::new("a"));
        assert_eq!(record.leader_transitions, 0);
        assert_eq!(elector.stats().forced_overwrites, 1);
    }

    #[tokio::test]
    async fn test_current_leader_falls_back_to_cache_on_read_failure() {
        let store = UnreadableStore::default();
        store.readable.store(true, Ordering::SeqCst);
        let clock = TestClock::default();

        let holder = elector("a", store.inner.clone(), clock.clone());
        assert!(holder.try_acquire_or_renew().await.unwrap());

        let observer =
            LeaderElector::with_clock(CandidateId::new("b"), store.clone(), config(), clock)
                .unwrap();

        // Populate the cache while the store is healthy, then break reads.
        assert_eq!(observer.current_leader().await, Some(CandidateId::new("a")));
        store.readable.store(false, Ordering::SeqCst);
        assert_eq!(observer.current_leader().await, Some(CandidateId::new("a")));
    }

    #[tokio::test]
    async fn test_current_leader_unknown_without_any_observation() {
        let store = UnreadableStore::default();
        let observer = LeaderElector::with_clock(
            CandidateId::new("b"),
            store,
            config(),
            TestClock::default(),
        )
        .unwrap();
        assert_eq!(observer.current_leader().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_invokes_hooks_once_per_transition() {
        let store = InMemoryLeaseStore::new();
        let clock = TestClock::default();
        let elector = Arc::new(elector("a", store.clone(), clock.clone()));

        let starts = Arc::new(AtomicU64::new(0));
        let stops = Arc::new(AtomicU64::new(0));
        let hooks = {
            let starts = Arc::clone(&starts);
            let stops = Arc::clone(&stops);
            LeadershipHooks::new(
                move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                },
                move || {
                    stops.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        let runner = {
            let elector = Arc::clone(&elector);
            tokio::spawn(async move { elector.run(hooks).await })
        };

        // First observation tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(elector.is_leading());
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 0);

        elector.stop();
        runner.await.unwrap().unwrap();
        assert!(!elector.is_leading());
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        // stop() is idempotent.
        elector.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_leading_ends_when_another_candidate_takes_over() {
        let store = InMemoryLeaseStore::new();
        let clock = TestClock::default();
        let elector = Arc::new(elector("a", store.clone(), clock.clone()));

        let runner = {
            let elector = Arc::clone(&elector);
            tokio::spawn(async move { elector.run(LeadershipHooks::noop()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(elector.is_leading());

        // Another candidate forcibly writes itself in with a fresh, valid
        // lease; the next renewal tick must observe the usurper and demote.
        clock.advance(1_000);
        let usurper =
            LeaseRecord::acquired(CandidateId::new("b"), 15_000, clock.now_unix_millis(), 9);
        store.force_set(usurper).await.unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!elector.is_leading());
        assert_eq!(elector.stats().leaderships_lost, 1);

        elector.stop();
        runner.await.unwrap().unwrap();
    }
}

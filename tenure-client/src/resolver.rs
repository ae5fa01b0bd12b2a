//! Leader discovery.
//!
//! Resolving "current leader address" is pluggable: the holder identity in
//! the lease record may double as a network address, or a separate address
//! registry may map identities to endpoints. The action client consults a
//! [`LeaderLocator`] before every attempt so a mid-retry handover is
//! followed.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tenure_core::{CandidateId, Clock, LeaseStore, Result, SystemClock};
use tenure_elector::LeaderElector;
use tenure_rpc::Endpoint;
use tracing::debug;

/// Maps a holder identity to a network endpoint.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, holder: &CandidateId) -> Option<Endpoint>;
}

/// The holder identity itself is the endpoint (e.g. `host:port` ids).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl AddressResolver for IdentityResolver {
    fn resolve(&self, holder: &CandidateId) -> Option<Endpoint> {
        Some(Endpoint::new(holder.as_str()))
    }
}

/// Address registry keyed by candidate identity.
///
/// Cheap to clone and safe to update concurrently while clients resolve
/// against it, which is exactly what happens during a handover.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    table: Arc<DashMap<CandidateId, Endpoint>>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, candidate: CandidateId, endpoint: Endpoint) {
        self.table.insert(candidate, endpoint);
    }

    pub fn deregister(&self, candidate: &CandidateId) {
        self.table.remove(candidate);
    }
}

impl AddressResolver for TableResolver {
    fn resolve(&self, holder: &CandidateId) -> Option<Endpoint> {
        self.table.get(holder).map(|entry| entry.clone())
    }
}

/// Yields the current leader's endpoint, consulted anew on every attempt.
#[async_trait]
pub trait LeaderLocator: Send + Sync {
    /// `Ok(None)` means no leader is currently resolvable, a transient
    /// condition during elections and handovers that the client retries.
    async fn locate(&self) -> Result<Option<Endpoint>>;
}

/// Locator backed directly by the lease store.
///
/// Only a valid (unexpired) lease names a leader; an expired record means
/// an election is in progress and resolves to `None`.
pub struct StoreLocator<S, R, C = SystemClock> {
    store: S,
    resolver: R,
    clock: C,
}

impl<S: LeaseStore, R: AddressResolver> StoreLocator<S, R, SystemClock> {
    pub fn new(store: S, resolver: R) -> Self {
        Self {
            store,
            resolver,
            clock: SystemClock,
        }
    }
}

impl<S: LeaseStore, R: AddressResolver, C: Clock> StoreLocator<S, R, C> {
    pub fn with_clock(store: S, resolver: R, clock: C) -> Self {
        Self {
            store,
            resolver,
            clock,
        }
    }
}

#[async_trait]
impl<S: LeaseStore, R: AddressResolver, C: Clock> LeaderLocator for StoreLocator<S, R, C> {
    async fn locate(&self) -> Result<Option<Endpoint>> {
        let Some((record, _)) = self.store.get().await? else {
            return Ok(None);
        };
        if !record.is_valid(self.clock.now_unix_millis()) {
            debug!(holder = %record.holder_identity, "lease expired, leader unresolved");
            return Ok(None);
        }
        Ok(self.resolver.resolve(&record.holder_identity))
    }
}

/// Locator backed by a running elector's leader view.
pub struct ElectorLocator<S, C, R> {
    elector: Arc<LeaderElector<S, C>>,
    resolver: R,
}

impl<S: LeaseStore, C: Clock, R: AddressResolver> ElectorLocator<S, C, R> {
    pub fn new(elector: Arc<LeaderElector<S, C>>, resolver: R) -> Self {
        Self { elector, resolver }
    }
}

#[async_trait]
impl<S: LeaseStore, C: Clock, R: AddressResolver> LeaderLocator for ElectorLocator<S, C, R> {
    async fn locate(&self) -> Result<Option<Endpoint>> {
        match self.elector.current_leader().await {
            Some(holder) => Ok(self.resolver.resolve(&holder)),
            None => Ok(None),
        }
    }
}

//! Leadership event bus.
//!
//! Electors publish their transitions on a broadcast channel so observers
//! (metrics, discovery caches) can follow leadership without hooking into
//! the callback pair.

use tenure_core::CandidateId;
use tokio::sync::broadcast;
use tracing::debug;

/// Leadership transitions observable from an elector.
#[derive(Debug, Clone)]
pub enum LeadershipEvent {
    /// This elector acquired the lease and started leading.
    BecameLeader { candidate: CandidateId, timestamp: u64 },

    /// This elector gave up or lost the lease.
    LostLeadership { candidate: CandidateId, timestamp: u64 },

    /// The observed record's holder changed to another candidate.
    LeaderChanged { holder: CandidateId, timestamp: u64 },
}

/// Broadcast bus for [`LeadershipEvent`]s.
///
/// Slow subscribers may observe lagged receives; events are advisory and
/// the lease record stays the source of truth.
#[derive(Debug)]
pub struct LeadershipEventBus {
    sender: broadcast::Sender<LeadershipEvent>,
}

impl LeadershipEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeadershipEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LeadershipEvent) {
        debug!(?event, "publishing leadership event");
        // No receivers is fine; events are best-effort.
        let _ = self.sender.send(event);
    }
}

impl Default for LeadershipEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let bus = LeadershipEventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(LeadershipEvent::BecameLeader {
            candidate: CandidateId::new("a"),
            timestamp: 1,
        });

        match rx.recv().await.unwrap() {
            LeadershipEvent::BecameLeader { candidate, .. } => {
                assert_eq!(candidate, CandidateId::new("a"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let bus = LeadershipEventBus::default();
        bus.publish(LeadershipEvent::LostLeadership {
            candidate: CandidateId::new("a"),
            timestamp: 2,
        });
    }
}

//! # Tenure Testing
//!
//! Testing utilities and simulation helpers for the Tenure coordination
//! framework: a manually driven clock, a fault-injecting lease store, and
//! a scripted transport, plus the integration tests under `tests/` that
//! exercise mutual exclusion, liveness, failover, and retry accounting
//! end to end.

pub mod flaky_store;
pub mod scripted_transport;
pub mod sim_clock;

pub use flaky_store::FlakyLeaseStore;
pub use scripted_transport::ScriptedTransport;
pub use sim_clock::SimClock;

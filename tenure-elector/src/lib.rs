//! # Tenure Elector
//!
//! Lease-based leader election for the Tenure coordination framework.
//!
//! This crate provides functionality for:
//! - Acquiring and renewing the shared lease record via compare-and-swap
//! - Detecting lease loss and handing leadership over
//! - Start/stop-leading callbacks and a leadership event bus
//! - Answering "who is leader now" queries for followers
//!
//! One [`LeaderElector`] runs per candidate process. It is the only writer
//! of its local leadership state; the shared lease record is mutated
//! exclusively through CAS, with the documented forced-overwrite recovery
//! path as the single exception.

pub mod config;
pub mod elector;
pub mod events;

pub use config::ElectionConfig;
pub use elector::{ElectionStats, LeaderElector, LeadershipHooks};
pub use events::{LeadershipEvent, LeadershipEventBus};

//! # Tenure Client
//!
//! Leader-following resilient action client for the Tenure coordination
//! framework.
//!
//! Followers submit control-plane actions to whichever process currently
//! holds leadership. The client discovers the leader's endpoint before
//! every attempt, classifies each outcome through `tenure-rpc`, and
//! retries transient failures under a jittered [`RetryPolicy`], so a
//! handover between attempts is followed rather than fought.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tenure_client::{ActionClient, IdentityResolver, StoreLocator};
//! use tenure_core::RetryPolicy;
//! use std::time::Duration;
//!
//! let locator = StoreLocator::new(store, IdentityResolver);
//! let client = ActionClient::new(transport, locator,
//!     RetryPolicy::fixed(Duration::from_millis(500)).with_max_attempts(8));
//!
//! let result: TaskStatus = client.submit(&action).await?;
//! ```
//!
//! [`RetryPolicy`]: tenure_core::RetryPolicy

pub mod client;
pub mod resolver;

pub use client::ActionClient;
pub use resolver::{
    AddressResolver, ElectorLocator, IdentityResolver, LeaderLocator, StoreLocator, TableResolver,
};

//! # Tenure RPC
//!
//! Action envelopes, the transport seam, and transport fault
//! classification for the Tenure coordination framework.
//!
//! The elected leader exposes a single request/response action endpoint.
//! Followers submit serialized actions with an idempotency token; the
//! transport reports every attempt as an [`RpcOutcome`], and
//! [`classify`] maps outcomes onto the retry decision:
//!
//! - `Timeout`, `ConnectionReset`, `ServerError`: retryable
//! - `HandshakeFailure`, `ProtocolViolation`, `ClientError`: fatal
//!
//! The raw wire transport is an external collaborator. This crate ships
//! only the traits plus [`ChannelTransport`], an in-process implementation
//! used by tests and single-process deployments.

pub mod channel;
pub mod classify;
pub mod envelope;
pub mod transport;

pub use channel::{ActionHandler, ChannelTransport, IdempotentHandler};
pub use classify::{classify, TransportFault, Verdict};
pub use envelope::{ActionEnvelope, Endpoint, ResultEnvelope};
pub use transport::{ActionTransport, ProxyConfig, RpcOutcome, TransportConfig};

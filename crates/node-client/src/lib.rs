//! `sw-node-client` — client for the node's frame protocol.
//!
//! One persistent WebSocket carries three interaction styles, multiplexed:
//! fire-and-forget events ([`NodeConnection::emit`]), correlated
//! request/reply calls ([`NodeConnection::request`]), and server-pushed
//! subscriptions ([`NodeConnection::subscribe`]).
//!
//! # Architecture
//!
//! ```text
//! caller ──► NodeLocator (get-or-create) ──► NodeConnection
//!                                                │
//!                         emit / request ──► writer task ──► socket
//!                                                │
//!            socket ──► reader task ──► Frame::decode ──► demultiplex
//!                                          │                  │
//!                                 CorrelationTable    SubscriptionTable
//!                                 (message-id)        (event name)
//! ```
//!
//! Requests suspend on a per-id rendezvous and are bounded by a timeout;
//! a disconnect fails every pending request instead of leaving callers
//! hanging. [`NodeApi`] layers typed payloads on top so the stringly-typed
//! frames stay inside this crate.

pub mod api;
pub mod connection;
pub mod correlation;
pub mod error;
pub mod locator;
pub mod subscription;

pub use api::NodeApi;
pub use connection::{ConnectionState, NodeConnection};
pub use correlation::CorrelationTable;
pub use error::NodeClientError;
pub use locator::NodeLocator;
pub use subscription::{EventHandler, SubscriptionTable};

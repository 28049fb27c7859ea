//! Node protocol: wire framing and the typed payloads carried on it.
//!
//! The node speaks text frames over a message-oriented socket. Each frame
//! is a header block and a body separated by the first blank line:
//!
//! ```text
//! event: send-transaction
//! message-id: 4b3c5f00-…
//! content-type: application/json
//!
//! {"from":"…","to":"…","amount":5}
//! ```
//!
//! [`frame`] is the untyped codec; [`events`] is the closed set of logical
//! operations and their payload shapes, decoded once at the client's API
//! boundary rather than re-interpreted by each caller.

pub mod events;
pub mod frame;

pub use frame::{Body, Frame, FrameError};
pub use frame::{CONTENT_TYPE_JSON, HDR_CONTENT_TYPE, HDR_EVENT, HDR_MESSAGE_ID};

/// Generate a fresh, globally-unique message id for an outbound frame.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

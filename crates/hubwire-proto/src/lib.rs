//! Wire types for the Hubwire RTM protocol.
//!
//! The service exposes two surfaces: a REST API taking form-encoded bodies
//! and returning JSON envelopes, and a websocket carrying one JSON object per
//! text frame. This crate owns the serde types for both and nothing else; no
//! I/O, no state.
//!
//! # Components
//!
//! - [`Snapshot`]: full workspace state returned by the bootstrap call
//! - [`Frame`]: decoded inbound websocket frame with a typed [`EventKind`]
//! - [`OutboundMessage`]: outbound frame rendering with deferred id stamping
//! - [`ChatPost`]: rich-payload REST post with string-encoded attachments

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chat;
mod frame;
mod snapshot;

pub use chat::ChatPost;
pub use frame::{EventKind, Frame, FrameError, OutboundMessage};
pub use snapshot::{Channel, Group, Im, Snapshot, User, UserSnapshot};

/// REST method names understood by the hub.
pub mod methods {
    /// Bootstrap call: returns the workspace snapshot and transport URL.
    pub const RTM_START: &str = "rtm.start";
    /// Opens (or returns) a direct-message session with a user.
    pub const IM_OPEN: &str = "im.open";
    /// Posts a rich message over REST instead of the socket.
    pub const CHAT_POST: &str = "chat.postMessage";
}

/// User id of the platform's system account.
///
/// Frames sent by this account are filtered out unless the session is
/// configured to process them.
pub const SYSTEM_ACCOUNT_ID: &str = "USLACKBOT";

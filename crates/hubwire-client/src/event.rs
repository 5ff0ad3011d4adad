//! Events fed into the session and actions it produces.

use hubwire_proto::{EventKind, Im, Snapshot};
use serde_json::Value;

use crate::queue::SendLimits;

/// Events the caller feeds into [`Session::handle`](crate::Session::handle).
///
/// Completion events for asynchronous boundaries carry the bootstrap
/// generation they belong to; the session ignores completions from before a
/// resync.
#[derive(Debug)]
pub enum SessionEvent {
    /// Begin the first bootstrap.
    Start,

    /// The bootstrap call returned a workspace snapshot.
    BootstrapCompleted {
        /// Generation the bootstrap was issued under.
        generation: u64,
        /// The returned snapshot.
        snapshot: Snapshot,
    },

    /// The bootstrap call failed.
    BootstrapFailed {
        /// Generation the bootstrap was issued under.
        generation: u64,
        /// Description of the failure.
        reason: String,
    },

    /// The transport finished opening.
    TransportOpened {
        /// Generation the transport was connected under.
        generation: u64,
    },

    /// The transport closed or errored.
    TransportClosed {
        /// Generation the transport was connected under.
        generation: u64,
        /// Close or error description.
        reason: String,
    },

    /// One inbound text frame arrived on the transport.
    FrameReceived {
        /// Generation the transport was connected under.
        generation: u64,
        /// Raw frame text, one JSON object.
        text: String,
    },

    /// Application intent: send `text` to `target`.
    SendRequested {
        /// Channel name or id, user name or id, or im id.
        target: String,
        /// Message text.
        text: String,
    },

    /// Application intent: send a keepalive ping.
    PingRequested,

    /// An `im.open` round trip completed.
    ImOpened {
        /// Generation the open was issued under.
        generation: u64,
        /// User the session was opened for.
        user_id: String,
        /// The new direct-message session.
        im: Im,
    },

    /// An `im.open` round trip failed.
    ImOpenFailed {
        /// Generation the open was issued under.
        generation: u64,
        /// User the open was issued for.
        user_id: String,
        /// Description of the failure.
        reason: String,
    },

    /// Runtime configuration change to the outbound validation caps.
    LimitsChanged {
        /// The new caps.
        limits: SendLimits,
    },
}

/// Actions returned by the session for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Issue the bootstrap REST call and report back with
    /// [`SessionEvent::BootstrapCompleted`] or
    /// [`SessionEvent::BootstrapFailed`].
    FetchSnapshot {
        /// Generation to echo in the completion event.
        generation: u64,
    },

    /// Connect the streaming transport to `url`.
    ConnectTransport {
        /// Generation to echo in transport events.
        generation: u64,
        /// Transport URL from the snapshot.
        url: String,
    },

    /// Tear down the active transport, if any.
    CloseTransport,

    /// Write one text frame to the transport.
    TransportSend {
        /// Rendered frame, one JSON object.
        text: String,
    },

    /// Issue an `im.open` REST call for `user_id` and report back with
    /// [`SessionEvent::ImOpened`] or [`SessionEvent::ImOpenFailed`].
    OpenIm {
        /// Generation to echo in the completion event.
        generation: u64,
        /// User to open the direct-message session with.
        user_id: String,
    },

    /// Deliver an enriched event to subscribers.
    Emit {
        /// The event to deliver.
        event: Event,
    },
}

/// An enriched event ready for subscribers.
///
/// The body is the inbound frame object with string `user`/`channel` ids
/// replaced by cached records and a `self` snapshot attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The frame's event kind.
    pub kind: EventKind,
    /// The enriched frame object.
    pub body: Value,
}

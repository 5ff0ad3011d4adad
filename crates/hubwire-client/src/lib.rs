//! Session core for the Hubwire RTM client.
//!
//! Action-based state machine for one hub session. Manages the connection
//! lifecycle, the mirrored workspace state, outbound queueing with
//! validation, and inbound frame filtering/enrichment.
//!
//! # Architecture
//!
//! The session is a pure state machine that:
//! - Receives events from the caller (completed REST calls, transport
//!   signals, inbound frames, application intents)
//! - Produces actions for the caller to execute (REST calls, transport
//!   connects and sends, subscriber emissions)
//! - Performs no I/O itself, so every lifecycle path is testable without a
//!   socket
//!
//! # Components
//!
//! - [`Session`]: top-level state machine owning the pieces below
//! - [`EntityCache`]: mirrored users/channels/groups/ims with lookup rules
//! - [`OutboundQueue`]: FIFO buffering, validation, and id stamping
//! - [`FilterPolicy`]: inbound filter flags, all default filter-out
//! - [`SessionEvent`] / [`SessionAction`]: the event/action vocabulary

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod dispatch;
mod error;
mod event;
mod queue;
mod session;

pub use cache::{ChannelRecord, EntityCache};
pub use dispatch::FilterPolicy;
pub use error::SessionError;
pub use event::{Event, SessionAction, SessionEvent};
pub use hubwire_proto::{Channel, EventKind, Frame, Group, Im, Snapshot, User, UserSnapshot};
pub use queue::{Destination, OutboundQueue, SendLimits};
pub use session::{ConnState, Session};

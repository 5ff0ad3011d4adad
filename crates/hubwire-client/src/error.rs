//! Session error types.

use hubwire_proto::FrameError;
use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The bootstrap call failed. The session cannot proceed to Connected.
    #[error("bootstrap failed: {reason}")]
    Bootstrap {
        /// Description of the bootstrap failure.
        reason: String,
    },

    /// An inbound frame could not be decoded or lacked a required payload.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),

    /// An event arrived that the current state cannot accept.
    #[error("invalid state: {reason}")]
    InvalidState {
        /// Description of the state violation.
        reason: String,
    },
}

impl SessionError {
    /// Returns true if this error is fatal for the session.
    ///
    /// Fatal errors mean the session cannot make progress; transient errors
    /// are reported per event and the dispatch loop continues.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Bootstrap { .. } | Self::InvalidState { .. } => true,
            Self::MalformedFrame(_) => false,
        }
    }
}

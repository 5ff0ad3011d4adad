//! Client-facing error type.

use hubwire_client::SessionError;
use thiserror::Error;

use crate::{rest::RestError, transport::TransportError};

/// Errors surfaced by the public client API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A REST call failed.
    #[error(transparent)]
    Rest(#[from] RestError),

    /// The streaming transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session state machine rejected an operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The driver task is gone; no further operations are possible.
    #[error("client is closed")]
    Closed,
}

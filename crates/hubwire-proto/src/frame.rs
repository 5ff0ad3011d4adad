//! Inbound frame envelope and outbound frame rendering.
//!
//! Frames are open-ended JSON objects: the hub adds fields freely and only
//! `type` is guaranteed. Decoding therefore keeps the full object around and
//! exposes typed accessors over it instead of forcing a closed struct.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::snapshot::{Channel, Group, Im, User};

/// Frame decode and payload-extraction failures.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame was not valid JSON.
    #[error("undecodable frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame decoded to something other than a JSON object.
    #[error("frame is not an object")]
    NotAnObject,

    /// The frame object carried no string `type` field.
    #[error("frame has no type field")]
    MissingType,

    /// A lifecycle frame lacked the payload object its type requires.
    #[error("frame of type {kind:?} is missing payload field `{field}`")]
    MissingPayload {
        /// The frame type that was being handled.
        kind: EventKind,
        /// The field that was absent or malformed.
        field: &'static str,
    },
}

/// Typed event kinds the session reacts to.
///
/// Everything else round-trips through [`EventKind::Other`] so subscribers
/// can still register for frame types the session itself ignores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// First frame after the socket opens.
    Hello,
    /// A chat message.
    Message,
    /// A user joined the workspace (`team_join`).
    UserJoined,
    /// A user record changed (`user_change`).
    UserChanged,
    /// The client joined a channel (`channel_joined`).
    ChannelJoined,
    /// The client joined a group (`group_joined`).
    GroupJoined,
    /// A direct-message session was opened remotely (`im_created`).
    ImCreated,
    /// Full resync required (`team_migration_started`).
    MigrationStarted,
    /// Lifecycle event fired locally once per successful bootstrap.
    Init,
    /// Any frame type without dedicated handling.
    Other(String),
}

impl EventKind {
    /// Map a wire `type` string to a kind.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "hello" => Self::Hello,
            "message" => Self::Message,
            "team_join" => Self::UserJoined,
            "user_change" => Self::UserChanged,
            "channel_joined" => Self::ChannelJoined,
            "group_joined" => Self::GroupJoined,
            "im_created" => Self::ImCreated,
            "team_migration_started" => Self::MigrationStarted,
            "init" => Self::Init,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire `type` string for this kind.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Hello => "hello",
            Self::Message => "message",
            Self::UserJoined => "team_join",
            Self::UserChanged => "user_change",
            Self::ChannelJoined => "channel_joined",
            Self::GroupJoined => "group_joined",
            Self::ImCreated => "im_created",
            Self::MigrationStarted => "team_migration_started",
            Self::Init => "init",
            Self::Other(kind) => kind,
        }
    }
}

/// A decoded inbound frame: its [`EventKind`] plus the full JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    kind: EventKind,
    body: Value,
}

impl Frame {
    /// Decode one websocket text frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameError` if the text is not JSON, not an object, or has
    /// no string `type` field.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `FrameError` if the value is not an object with a string
    /// `type` field.
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        if !value.is_object() {
            return Err(FrameError::NotAnObject);
        }
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(EventKind::from_wire)
            .ok_or(FrameError::MissingType)?;

        Ok(Self { kind, body: value })
    }

    /// The frame's event kind.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The full frame object.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the frame, keeping the raw object.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Sender user id, when the frame carries one as a plain string.
    pub fn sender(&self) -> Option<&str> {
        self.body.get("user").and_then(Value::as_str)
    }

    /// Channel id, when the frame carries one as a plain string.
    pub fn channel_id(&self) -> Option<&str> {
        self.body.get("channel").and_then(Value::as_str)
    }

    /// Subtype marker, if present.
    pub fn subtype(&self) -> Option<&str> {
        self.body.get("subtype").and_then(Value::as_str)
    }

    /// True if the frame carries a reply-correlation marker.
    pub fn is_reply(&self) -> bool {
        self.body.get("reply_to").is_some()
    }

    /// Extract the [`User`] payload of a `team_join` / `user_change` frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::MissingPayload` if the `user` field is absent or
    /// not a user object.
    pub fn payload_user(&self) -> Result<User, FrameError> {
        self.payload("user")
    }

    /// Extract the [`Channel`] payload of a `channel_joined` frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::MissingPayload` on an absent or malformed
    /// `channel` field.
    pub fn payload_channel(&self) -> Result<Channel, FrameError> {
        self.payload("channel")
    }

    /// Extract the [`Group`] payload of a `group_joined` frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::MissingPayload` on an absent or malformed
    /// `channel` field.
    pub fn payload_group(&self) -> Result<Group, FrameError> {
        self.payload("channel")
    }

    /// Extract the [`Im`] payload of an `im_created` frame.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::MissingPayload` on an absent or malformed
    /// `channel` field.
    pub fn payload_im(&self) -> Result<Im, FrameError> {
        self.payload("channel")
    }

    fn payload<T: serde::de::DeserializeOwned>(
        &self,
        field: &'static str,
    ) -> Result<T, FrameError> {
        let value = self
            .body
            .get(field)
            .cloned()
            .ok_or(FrameError::MissingPayload { kind: self.kind.clone(), field })?;
        serde_json::from_value(value)
            .map_err(|_| FrameError::MissingPayload { kind: self.kind.clone(), field })
    }
}

/// Outbound socket frame.
///
/// The id is optional because validation happens on the id-less rendering:
/// ids are stamped at the moment of transmission, not at enqueue time.
#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    /// Monotonic message id, present only on the transmitted rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Frame type, `"message"` or `"ping"`.
    #[serde(rename = "type")]
    pub kind: &'a str,
    /// Destination channel id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<&'a str>,
    /// Message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> OutboundMessage<'a> {
    /// A chat message to a channel.
    pub fn message(channel: &'a str, text: &'a str) -> Self {
        Self { id: None, kind: "message", channel: Some(channel), text: Some(text) }
    }

    /// A keepalive ping.
    pub fn ping() -> Self {
        Self { id: None, kind: "ping", channel: None, text: None }
    }

    /// Render to the wire, optionally stamping an id.
    pub fn render(&self, id: Option<u64>) -> String {
        let stamped = Self { id, kind: self.kind, channel: self.channel, text: self.text };
        serde_json::to_string(&stamped).unwrap_or_default()
    }
}

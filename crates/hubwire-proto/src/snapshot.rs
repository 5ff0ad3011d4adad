//! Workspace snapshot types.
//!
//! The bootstrap call returns the entire workspace state in one envelope:
//! the streaming-transport URL, the client's own identity, and the full
//! user/channel/group/im collections the session mirrors locally.

use serde::{Deserialize, Serialize};

/// A workspace member.
///
/// `id` is the stable unique key; `name` is a secondary lookup key that the
/// service does not guarantee unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable unique id (`U…`).
    pub id: String,
    /// Display name, secondary lookup key.
    #[serde(default)]
    pub name: String,
    /// Full name, if the member set one.
    #[serde(default)]
    pub real_name: Option<String>,
    /// Workspace admin flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Workspace owner flag.
    #[serde(default)]
    pub is_owner: bool,
    /// Set for bot accounts.
    #[serde(default)]
    pub is_bot: bool,
    /// Set once the account has been deactivated.
    #[serde(default)]
    pub deleted: bool,
}

/// Projection of a [`User`] attached to enriched events.
///
/// Carries only the identity fields subscribers need; the `deleted` flag and
/// any future bookkeeping fields stay out of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// Stable unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Full name, if set.
    pub real_name: Option<String>,
    /// Workspace admin flag.
    pub is_admin: bool,
    /// Workspace owner flag.
    pub is_owner: bool,
    /// Set for bot accounts.
    pub is_bot: bool,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            real_name: user.real_name.clone(),
            is_admin: user.is_admin,
            is_owner: user.is_owner,
            is_bot: user.is_bot,
        }
    }
}

/// A named channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Stable unique id (`C…`).
    pub id: String,
    /// Channel name.
    #[serde(default)]
    pub name: String,
    /// Tri-state IM indicator. The service omits the field on some channel
    /// kinds; absence is treated as "not an IM" for validation purposes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_im: Option<bool>,
}

/// A private group.
///
/// Same lookup semantics as [`Channel`] but mirrored in a distinct
/// collection, and never an IM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Stable unique id (`G…`).
    pub id: String,
    /// Group name.
    #[serde(default)]
    pub name: String,
}

/// A direct-message session with one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Im {
    /// Stable unique id (`D…`).
    pub id: String,
    /// Id of the user on the other side.
    #[serde(default)]
    pub user: String,
}

/// Full workspace snapshot returned by the bootstrap call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    /// Streaming-transport URL to connect to next.
    pub url: String,
    /// The client's own identity.
    #[serde(rename = "self")]
    pub self_user: User,
    /// All workspace members.
    #[serde(default)]
    pub users: Vec<User>,
    /// All channels visible to the client.
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// All groups the client belongs to.
    #[serde(default)]
    pub groups: Vec<Group>,
    /// All open direct-message sessions.
    #[serde(default)]
    pub ims: Vec<Im>,
}

//! Mirrored workspace state.
//!
//! One cache per session, created from a bootstrap snapshot and replaced
//! wholesale on resync. Collections keep insertion order because name
//! lookups resolve to the first match; ids are unique within a collection.
//!
//! The cache is only ever mutated from the inbound dispatch path or on
//! completion of a lazy IM open, and it is never handed out by reference
//! beyond the session's owner.

use hubwire_proto::{Channel, Group, Im, Snapshot, User, UserSnapshot};
use serde_json::Value;

/// A resolved channel-like destination.
///
/// `resolve_channel` can land in any of the three collections; the variant
/// records which one, and [`ChannelRecord::is_im`] folds the tri-state IM
/// indicator into the validation policy (absence means "not an IM").
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelRecord {
    /// A named channel.
    Channel(Channel),
    /// A private group. Never an IM.
    Group(Group),
    /// A direct-message session. Always an IM.
    Im(Im),
}

impl ChannelRecord {
    /// The destination channel id.
    pub fn id(&self) -> &str {
        match self {
            Self::Channel(c) => &c.id,
            Self::Group(g) => &g.id,
            Self::Im(im) => &im.id,
        }
    }

    /// Whether the destination counts as a direct-message channel for
    /// validation purposes.
    pub fn is_im(&self) -> bool {
        match self {
            Self::Channel(c) => c.is_im.unwrap_or(false),
            Self::Group(_) => false,
            Self::Im(_) => true,
        }
    }

    /// The full record as JSON, for event enrichment.
    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::Channel(c) => serde_json::to_value(c),
            Self::Group(g) => serde_json::to_value(g),
            Self::Im(im) => serde_json::to_value(im),
        };
        value.unwrap_or(Value::Null)
    }
}

/// Mirror of the remote workspace.
#[derive(Debug, Default)]
pub struct EntityCache {
    users: Vec<User>,
    channels: Vec<Channel>,
    groups: Vec<Group>,
    ims: Vec<Im>,
    self_record: Option<User>,
}

impl EntityCache {
    /// Build a cache from a bootstrap snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            users: snapshot.users.clone(),
            channels: snapshot.channels.clone(),
            groups: snapshot.groups.clone(),
            ims: snapshot.ims.clone(),
            self_record: Some(snapshot.self_user.clone()),
        }
    }

    /// The session's own user id, empty before the first bootstrap.
    pub fn self_id(&self) -> &str {
        self.self_record.as_ref().map_or("", |u| u.id.as_str())
    }

    /// Projected snapshot of the session's own identity.
    ///
    /// Prefers the full record from the users collection; the identity
    /// object in the bootstrap envelope is sparser.
    pub fn self_snapshot(&self) -> Option<UserSnapshot> {
        let own = self.self_record.as_ref()?;
        let record = self.users.iter().find(|u| u.id == own.id).unwrap_or(own);
        Some(UserSnapshot::from(record))
    }

    /// Resolve a channel-like destination.
    ///
    /// Match order: channel by name, channel by id, im by id, group by id,
    /// group by name. First match wins.
    pub fn resolve_channel(&self, term: &str) -> Option<ChannelRecord> {
        if let Some(c) = self.channels.iter().find(|c| c.name == term) {
            return Some(ChannelRecord::Channel(c.clone()));
        }
        if let Some(c) = self.channels.iter().find(|c| c.id == term) {
            return Some(ChannelRecord::Channel(c.clone()));
        }
        if let Some(im) = self.ims.iter().find(|im| im.id == term) {
            return Some(ChannelRecord::Im(im.clone()));
        }
        if let Some(g) = self.groups.iter().find(|g| g.id == term) {
            return Some(ChannelRecord::Group(g.clone()));
        }
        if let Some(g) = self.groups.iter().find(|g| g.name == term) {
            return Some(ChannelRecord::Group(g.clone()));
        }
        None
    }

    /// Resolve a user by name, then by id.
    pub fn resolve_user(&self, term: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.name == term)
            .or_else(|| self.users.iter().find(|u| u.id == term))
    }

    /// Resolve a direct-message session.
    ///
    /// Match order: im by associated-user id, im by the id of the user the
    /// term resolves to, im by its own id.
    pub fn resolve_im(&self, term: &str) -> Option<&Im> {
        if let Some(im) = self.ims.iter().find(|im| im.user == term) {
            return Some(im);
        }
        if let Some(user) = self.resolve_user(term) {
            if let Some(im) = self.ims.iter().find(|im| im.user == user.id) {
                return Some(im);
            }
        }
        self.ims.iter().find(|im| im.id == term)
    }

    /// Append a user who joined the workspace.
    pub fn push_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// Replace a user record in place, identity preserved by id.
    ///
    /// Returns false if no record with that id exists.
    pub fn replace_user(&mut self, user: User) -> bool {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user;
                true
            },
            None => false,
        }
    }

    /// Append a newly joined channel.
    pub fn push_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    /// Append a newly joined group.
    pub fn push_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    /// Append a direct-message session, skipping ids already present.
    pub fn push_im(&mut self, im: Im) {
        if !self.ims.iter().any(|existing| existing.id == im.id) {
            self.ims.push(im);
        }
    }
}

//! Inbound filter policy and event enrichment.
//!
//! Filtering decides whether a frame reaches subscribers at all; enrichment
//! swaps the raw ids on an admitted frame for the cached records so
//! subscribers never have to resolve anything themselves. Cache mutations
//! happen before either step and are not affected by filtering — see
//! [`Session`](crate::Session) for the ordering.

use hubwire_proto::{Frame, SYSTEM_ACCOUNT_ID};
use serde_json::Value;

use crate::{cache::EntityCache, event::Event};

/// Inbound filter flags. Every flag defaults to filter-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterPolicy {
    /// Admit frames sent by the platform's system account.
    pub process_slackbot: bool,
    /// Admit frames carrying a reply-correlation marker.
    pub process_replies: bool,
    /// Admit frames carrying a subtype marker.
    pub process_subtypes: bool,
    /// Admit the session's own echoed frames.
    pub process_self: bool,
}

impl FilterPolicy {
    /// Whether the policy admits `frame` for dispatch.
    pub fn admits(&self, frame: &Frame, self_id: &str) -> bool {
        if !self.process_slackbot && frame.sender() == Some(SYSTEM_ACCOUNT_ID) {
            return false;
        }
        if !self.process_replies && frame.is_reply() {
            return false;
        }
        if !self.process_subtypes && frame.subtype().is_some() {
            return false;
        }
        if !self.process_self && !self_id.is_empty() && frame.sender() == Some(self_id) {
            return false;
        }
        true
    }
}

/// Enrich an admitted frame into a subscriber-ready [`Event`].
///
/// Replaces a string `user` field with the projected snapshot of the
/// resolved user, a string `channel` field with the full cached record, and
/// attaches a `self` field with the session's own snapshot. Unresolvable ids
/// are left as-is.
pub fn enrich(frame: Frame, cache: &EntityCache) -> Event {
    let kind = frame.kind().clone();
    let mut body = frame.into_body();

    if let Some(object) = body.as_object_mut() {
        let resolved_user = object
            .get("user")
            .and_then(Value::as_str)
            .and_then(|id| cache.resolve_user(id))
            .map(hubwire_proto::UserSnapshot::from);
        if let Some(snapshot) = resolved_user {
            if let Ok(value) = serde_json::to_value(snapshot) {
                object.insert("user".to_string(), value);
            }
        }

        let resolved_channel = object
            .get("channel")
            .and_then(Value::as_str)
            .and_then(|id| cache.resolve_channel(id));
        if let Some(record) = resolved_channel {
            object.insert("channel".to_string(), record.to_value());
        }

        if let Some(own) = cache.self_snapshot() {
            if let Ok(value) = serde_json::to_value(own) {
                object.insert("self".to_string(), value);
            }
        }
    }

    Event { kind, body }
}

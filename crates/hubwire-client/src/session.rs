//! Session state machine.
//!
//! The `Session` is the top-level state machine that owns the entity cache
//! and the outbound queue, runs the connection lifecycle, and turns inbound
//! frames into subscriber emissions. Pure state machine - returns actions,
//! caller handles I/O.
//!
//! # Lifecycle
//!
//! `Disconnected → Bootstrapping → Connected`; `Connected → Disconnected` on
//! transport close or error; `Connected → Bootstrapping` on a remote resync
//! signal. No other transitions exist.
//!
//! Asynchronous boundaries (bootstrap, IM open, transport) are tied to a
//! bootstrap generation: a resync bumps the generation, so completions from
//! the torn-down world are recognized as stale and dropped instead of being
//! applied against a replaced cache.

use std::collections::HashMap;

use hubwire_proto::{EventKind, Frame, OutboundMessage};
use serde_json::json;

use crate::{
    cache::EntityCache,
    dispatch::{self, FilterPolicy},
    error::SessionError,
    event::{Event, SessionAction, SessionEvent},
    queue::{Destination, OutboundQueue, SendLimits},
};

/// Connection state visible to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    /// No transport; sends are queued.
    #[default]
    Disconnected,
    /// Bootstrap or transport connect in flight.
    Bootstrapping,
    /// Transport open; sends transmit immediately.
    Connected,
}

/// Work deferred until an `im.open` round trip completes.
#[derive(Debug)]
enum ImFollowup {
    /// Resend a message to the freshly opened session.
    Resend { text: String },
    /// Dispatch a held inbound frame (user-joined handling).
    Dispatch { frame: Frame },
}

/// Session state machine.
///
/// Manages the connection lifecycle and the mirrored workspace state.
/// Pure state machine - the caller executes the returned actions.
pub struct Session {
    token: String,
    state: ConnState,
    generation: u64,
    cache: EntityCache,
    queue: OutboundQueue,
    policy: FilterPolicy,
    /// In-flight `im.open` registry keyed by user id. Deduplicates
    /// concurrent opens for the same user; cleared on resync.
    pending_opens: HashMap<String, Vec<ImFollowup>>,
}

impl Session {
    /// Create a session holding `token` with the given filter policy.
    pub fn new(token: impl Into<String>, policy: FilterPolicy) -> Self {
        Self {
            token: token.into(),
            state: ConnState::Disconnected,
            generation: 0,
            cache: EntityCache::default(),
            queue: OutboundQueue::new(),
            policy,
            pending_opens: HashMap::new(),
        }
    }

    /// The opaque credential the session was constructed with.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Current connection state.
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Current bootstrap generation. Completions tagged with an older
    /// generation belong to a torn-down world and must be discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The mirrored workspace state.
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Number of sends waiting for the next transition into Connected.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the event cannot be processed. Only errors
    /// where [`SessionError::is_fatal`] is true end the session; malformed
    /// frames are reported per frame and the loop continues.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Start => self.handle_start(),
            SessionEvent::BootstrapCompleted { generation, snapshot } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                self.handle_bootstrap_completed(&snapshot)
            },
            SessionEvent::BootstrapFailed { generation, reason } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                self.state = ConnState::Disconnected;
                Err(SessionError::Bootstrap { reason })
            },
            SessionEvent::TransportOpened { generation } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                Ok(self.handle_transport_opened())
            },
            SessionEvent::TransportClosed { generation, reason } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                tracing::info!(%reason, "transport closed");
                self.state = ConnState::Disconnected;
                Ok(vec![])
            },
            SessionEvent::FrameReceived { generation, text } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                let frame = Frame::decode(&text)?;
                self.dispatch_frame(frame)
            },
            SessionEvent::SendRequested { target, text } => Ok(self.handle_send(&target, &text)),
            SessionEvent::PingRequested => Ok(self.handle_ping()),
            SessionEvent::ImOpened { generation, user_id, im } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                self.handle_im_opened(&user_id, im)
            },
            SessionEvent::ImOpenFailed { generation, user_id, reason } => {
                if self.stale(generation) {
                    return Ok(vec![]);
                }
                let dropped = self.pending_opens.remove(&user_id).map_or(0, |f| f.len());
                tracing::warn!(%user_id, %reason, dropped, "im.open failed");
                Ok(vec![])
            },
            SessionEvent::LimitsChanged { limits } => {
                self.queue.set_limits(limits);
                Ok(vec![])
            },
        }
    }

    /// Replace the outbound validation caps directly.
    pub fn set_limits(&mut self, limits: SendLimits) {
        self.queue.set_limits(limits);
    }

    fn stale(&self, generation: u64) -> bool {
        if generation == self.generation {
            return false;
        }
        tracing::debug!(got = generation, current = self.generation, "dropping stale completion");
        true
    }

    fn handle_start(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != ConnState::Disconnected {
            return Err(SessionError::InvalidState {
                reason: "start while a session is already active".to_string(),
            });
        }
        Ok(self.begin_bootstrap())
    }

    /// Enter Bootstrapping under a fresh generation.
    fn begin_bootstrap(&mut self) -> Vec<SessionAction> {
        self.generation += 1;
        self.state = ConnState::Bootstrapping;
        self.pending_opens.clear();
        vec![SessionAction::FetchSnapshot { generation: self.generation }]
    }

    fn handle_bootstrap_completed(
        &mut self,
        snapshot: &hubwire_proto::Snapshot,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != ConnState::Bootstrapping {
            return Err(SessionError::InvalidState {
                reason: "bootstrap completion outside Bootstrapping".to_string(),
            });
        }

        // Wholesale replacement: the old mirror is discarded, never merged.
        self.cache = EntityCache::from_snapshot(snapshot);
        tracing::info!(self_id = self.cache.self_id(), "bootstrap complete");

        let init = Event {
            kind: EventKind::Init,
            body: json!({
                "type": "init",
                "self": self.cache.self_snapshot(),
            }),
        };

        Ok(vec![
            SessionAction::Emit { event: init },
            SessionAction::ConnectTransport {
                generation: self.generation,
                url: snapshot.url.clone(),
            },
        ])
    }

    fn handle_transport_opened(&mut self) -> Vec<SessionAction> {
        if self.state == ConnState::Connected {
            return vec![];
        }
        self.state = ConnState::Connected;
        tracing::info!(queued = self.queue.len(), "transport open");

        // Drained exactly once per transition into Connected, FIFO.
        self.queue
            .drain()
            .into_iter()
            .map(|text| SessionAction::TransportSend { text })
            .collect()
    }

    fn handle_send(&mut self, target: &str, text: &str) -> Vec<SessionAction> {
        let destination = self
            .cache
            .resolve_channel(target)
            .map(|record| Destination { id: record.id().to_string(), is_im: record.is_im() })
            .or_else(|| {
                self.cache
                    .resolve_im(target)
                    .map(|im| Destination { id: im.id.clone(), is_im: true })
            });

        if let Some(dest) = destination {
            return self.submit(&dest, text);
        }

        // No channel-like destination: a user reference means we open the
        // direct-message session lazily and resend once it lands.
        if let Some(user) = self.cache.resolve_user(target) {
            let user_id = user.id.clone();
            return self.defer_until_im_open(user_id, ImFollowup::Resend { text: text.to_string() });
        }

        tracing::warn!(%target, "dropping send to unresolvable target");
        vec![]
    }

    fn submit(&mut self, dest: &Destination, text: &str) -> Vec<SessionAction> {
        let connected = self.state == ConnState::Connected;
        match self.queue.submit(dest, text, connected) {
            Some(frame) => vec![SessionAction::TransportSend { text: frame }],
            None => vec![],
        }
    }

    fn handle_ping(&mut self) -> Vec<SessionAction> {
        if self.state != ConnState::Connected {
            tracing::warn!("dropping ping while not connected");
            return vec![];
        }
        let id = self.queue.assign_id();
        vec![SessionAction::TransportSend { text: OutboundMessage::ping().render(Some(id)) }]
    }

    /// Register a followup for `user_id`, issuing the `im.open` only if this
    /// user has no open already in flight.
    fn defer_until_im_open(&mut self, user_id: String, followup: ImFollowup) -> Vec<SessionAction> {
        let pending = self.pending_opens.entry(user_id.clone()).or_default();
        let first = pending.is_empty();
        pending.push(followup);

        if first {
            vec![SessionAction::OpenIm { generation: self.generation, user_id }]
        } else {
            vec![]
        }
    }

    fn handle_im_opened(
        &mut self,
        user_id: &str,
        im: hubwire_proto::Im,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let dest = Destination { id: im.id.clone(), is_im: true };
        self.cache.push_im(im);

        let followups = self.pending_opens.remove(user_id).unwrap_or_default();
        let mut actions = Vec::new();
        for followup in followups {
            match followup {
                ImFollowup::Resend { text } => actions.extend(self.submit(&dest, &text)),
                ImFollowup::Dispatch { frame } => actions.extend(self.emit_filtered(frame)),
            }
        }
        Ok(actions)
    }

    /// Run an inbound frame through mutation, filtering, and enrichment.
    fn dispatch_frame(&mut self, frame: Frame) -> Result<Vec<SessionAction>, SessionError> {
        // Mutations always run, and run before any emission.
        match frame.kind().clone() {
            EventKind::MigrationStarted => {
                tracing::info!("resync requested by hub");
                let mut actions = vec![SessionAction::CloseTransport];
                actions.extend(self.begin_bootstrap());
                return Ok(actions);
            },
            EventKind::UserJoined => {
                let user = frame.payload_user()?;
                let user_id = user.id.clone();
                self.cache.push_user(user);

                // The direct-message session must exist before the frame is
                // dispatched; hold the frame until the open completes.
                if self.cache.resolve_im(&user_id).is_some() {
                    return Ok(self.emit_filtered(frame));
                }
                return Ok(self.defer_until_im_open(user_id, ImFollowup::Dispatch { frame }));
            },
            EventKind::UserChanged => {
                let user = frame.payload_user()?;
                if !self.cache.replace_user(user) {
                    tracing::warn!("user_change for unknown user");
                }
            },
            EventKind::ChannelJoined => {
                self.cache.push_channel(frame.payload_channel()?);
            },
            EventKind::GroupJoined => {
                self.cache.push_group(frame.payload_group()?);
            },
            EventKind::ImCreated => {
                self.cache.push_im(frame.payload_im()?);
            },
            _ => {},
        }

        Ok(self.emit_filtered(frame))
    }

    fn emit_filtered(&self, frame: Frame) -> Vec<SessionAction> {
        if !self.policy.admits(&frame, self.cache.self_id()) {
            return vec![];
        }
        let event = dispatch::enrich(frame, &self.cache);
        vec![SessionAction::Emit { event }]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hubwire_proto::{Im, Snapshot};
    use serde_json::json;

    use super::*;

    fn snapshot() -> Snapshot {
        serde_json::from_value(json!({
            "url": "wss://hub.example/socket",
            "self": { "id": "U0", "name": "me" },
            "users": [
                { "id": "U0", "name": "me" },
                { "id": "U1", "name": "alice" }
            ],
            "channels": [{ "id": "C1", "name": "general" }],
            "groups": [],
            "ims": [{ "id": "D1", "user": "U1" }]
        }))
        .unwrap()
    }

    /// Drive a fresh session to Connected and return it with its current
    /// generation.
    fn connected_session() -> (Session, u64) {
        let mut session = Session::new("tok", FilterPolicy::default());
        session.handle(SessionEvent::Start).unwrap();
        session
            .handle(SessionEvent::BootstrapCompleted { generation: 1, snapshot: snapshot() })
            .unwrap();
        session.handle(SessionEvent::TransportOpened { generation: 1 }).unwrap();
        (session, 1)
    }

    fn frame_event(generation: u64, value: serde_json::Value) -> SessionEvent {
        SessionEvent::FrameReceived { generation, text: value.to_string() }
    }

    #[test]
    fn start_requests_bootstrap() {
        let mut session = Session::new("tok", FilterPolicy::default());
        let actions = session.handle(SessionEvent::Start).unwrap();
        assert_eq!(actions, vec![SessionAction::FetchSnapshot { generation: 1 }]);
        assert_eq!(session.state(), ConnState::Bootstrapping);
    }

    #[test]
    fn double_start_is_rejected() {
        let mut session = Session::new("tok", FilterPolicy::default());
        session.handle(SessionEvent::Start).unwrap();
        let result = session.handle(SessionEvent::Start);
        assert!(matches!(result, Err(SessionError::InvalidState { .. })));
    }

    #[test]
    fn bootstrap_fires_init_then_connects() {
        let mut session = Session::new("tok", FilterPolicy::default());
        session.handle(SessionEvent::Start).unwrap();

        let actions = session
            .handle(SessionEvent::BootstrapCompleted { generation: 1, snapshot: snapshot() })
            .unwrap();

        assert_eq!(actions.len(), 2);
        match &actions[0] {
            SessionAction::Emit { event } => {
                assert_eq!(event.kind, EventKind::Init);
                assert_eq!(event.body["self"]["id"], "U0");
            },
            other => unreachable!("expected init emission, got {other:?}"),
        }
        assert_eq!(
            actions[1],
            SessionAction::ConnectTransport {
                generation: 1,
                url: "wss://hub.example/socket".to_string()
            }
        );
        // Still not Connected until the transport opens.
        assert_eq!(session.state(), ConnState::Bootstrapping);
    }

    #[test]
    fn bootstrap_failure_is_fatal_and_disconnects() {
        let mut session = Session::new("tok", FilterPolicy::default());
        session.handle(SessionEvent::Start).unwrap();

        let result = session.handle(SessionEvent::BootstrapFailed {
            generation: 1,
            reason: "status 500".to_string(),
        });
        let err = result.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(session.state(), ConnState::Disconnected);
    }

    #[test]
    fn open_transitions_to_connected_and_drains_fifo() {
        let mut session = Session::new("tok", FilterPolicy::default());
        session.handle(SessionEvent::Start).unwrap();
        session
            .handle(SessionEvent::BootstrapCompleted { generation: 1, snapshot: snapshot() })
            .unwrap();

        // Queued while Bootstrapping.
        session
            .handle(SessionEvent::SendRequested {
                target: "general".to_string(),
                text: "one".to_string(),
            })
            .unwrap();
        session
            .handle(SessionEvent::SendRequested {
                target: "C1".to_string(),
                text: "two".to_string(),
            })
            .unwrap();
        assert_eq!(session.queued(), 2);

        let actions = session.handle(SessionEvent::TransportOpened { generation: 1 }).unwrap();
        let frames: Vec<&str> = actions
            .iter()
            .map(|a| match a {
                SessionAction::TransportSend { text } => text.as_str(),
                other => unreachable!("expected sends, got {other:?}"),
            })
            .collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains(r#""id":0"#) && frames[0].contains("one"));
        assert!(frames[1].contains(r#""id":1"#) && frames[1].contains("two"));
        assert_eq!(session.state(), ConnState::Connected);
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn connected_send_transmits_immediately() {
        let (mut session, _) = connected_session();
        let actions = session
            .handle(SessionEvent::SendRequested {
                target: "general".to_string(),
                text: "hi".to_string(),
            })
            .unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::TransportSend {
                text: r#"{"id":0,"type":"message","channel":"C1","text":"hi"}"#.to_string()
            }]
        );
    }

    #[test]
    fn unresolvable_target_is_dropped_silently() {
        let (mut session, _) = connected_session();
        let actions = session
            .handle(SessionEvent::SendRequested {
                target: "nobody".to_string(),
                text: "hi".to_string(),
            })
            .unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn send_to_user_without_im_opens_one() {
        let (mut session, generation) = connected_session();

        // team_join for a user without an im parks an open.
        session
            .handle(frame_event(
                generation,
                json!({ "type": "team_join", "user": { "id": "U2", "name": "carol" } }),
            ))
            .unwrap();

        // The join itself parked an open for U2; a send targeting carol
        // joins the same in-flight open rather than issuing a second one.
        let actions = session
            .handle(SessionEvent::SendRequested {
                target: "carol".to_string(),
                text: "welcome".to_string(),
            })
            .unwrap();
        assert!(actions.is_empty(), "second open for the same user must be deduplicated");

        let actions = session
            .handle(SessionEvent::ImOpened {
                generation,
                user_id: "U2".to_string(),
                im: Im { id: "D2".to_string(), user: "U2".to_string() },
            })
            .unwrap();

        // Held join frame dispatches first, then the resend transmits.
        assert_eq!(actions.len(), 2);
        match &actions[0] {
            SessionAction::Emit { event } => assert_eq!(event.kind, EventKind::UserJoined),
            other => unreachable!("expected emission, got {other:?}"),
        }
        match &actions[1] {
            SessionAction::TransportSend { text } => {
                assert!(text.contains(r#""channel":"D2""#) && text.contains("welcome"));
            },
            other => unreachable!("expected send, got {other:?}"),
        }
        assert!(session.cache().resolve_user("carol").is_some());
        assert_eq!(session.cache().resolve_im("U2").unwrap().id, "D2");
    }

    #[test]
    fn im_open_failure_drops_followups() {
        let (mut session, generation) = connected_session();
        session
            .handle(frame_event(
                generation,
                json!({ "type": "team_join", "user": { "id": "U2", "name": "carol" } }),
            ))
            .unwrap();

        let actions = session
            .handle(SessionEvent::ImOpenFailed {
                generation,
                user_id: "U2".to_string(),
                reason: "api error".to_string(),
            })
            .unwrap();
        assert!(actions.is_empty());

        // The user stays resolvable; only the dispatch cycle was skipped.
        assert!(session.cache().resolve_user("U2").is_some());
        assert!(session.cache().resolve_im("U2").is_none());
    }

    #[test]
    fn team_join_with_existing_im_dispatches_immediately() {
        let (mut session, generation) = connected_session();
        session
            .handle(frame_event(generation, json!({ "type": "im_created", "channel": { "id": "D2", "user": "U2" } })))
            .unwrap();

        let actions = session
            .handle(frame_event(
                generation,
                json!({ "type": "team_join", "user": { "id": "U2", "name": "carol" } }),
            ))
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], SessionAction::Emit { .. }));
    }

    #[test]
    fn message_enrichment_end_to_end() {
        let (mut session, generation) = connected_session();
        let actions = session
            .handle(frame_event(
                generation,
                json!({ "type": "message", "channel": "C1", "user": "U1", "text": "Hello world" }),
            ))
            .unwrap();

        assert_eq!(actions.len(), 1);
        match &actions[0] {
            SessionAction::Emit { event } => {
                assert_eq!(event.kind, EventKind::Message);
                assert_eq!(event.body["channel"]["id"], "C1");
                assert_eq!(event.body["channel"]["name"], "general");
                assert_eq!(event.body["user"]["name"], "alice");
                assert_eq!(event.body["self"]["id"], "U0");
                assert_eq!(event.body["text"], "Hello world");
            },
            other => unreachable!("expected emission, got {other:?}"),
        }
    }

    #[test]
    fn subtyped_frame_is_filtered_but_mutations_run() {
        let (mut session, generation) = connected_session();
        let actions = session
            .handle(frame_event(
                generation,
                json!({
                    "type": "channel_joined",
                    "subtype": "weird",
                    "channel": { "id": "C2", "name": "random" }
                }),
            ))
            .unwrap();

        // Filtered from dispatch, but the mutation landed.
        assert!(actions.is_empty());
        assert_eq!(session.cache().resolve_channel("random").unwrap().id(), "C2");
    }

    #[test]
    fn user_change_replaces_record() {
        let (mut session, generation) = connected_session();
        session
            .handle(frame_event(
                generation,
                json!({
                    "type": "user_change",
                    "user": { "id": "U1", "name": "alice", "real_name": "Alice A" }
                }),
            ))
            .unwrap();
        assert_eq!(
            session.cache().resolve_user("U1").unwrap().real_name.as_deref(),
            Some("Alice A")
        );
    }

    #[test]
    fn malformed_frame_is_recoverable() {
        let (mut session, generation) = connected_session();
        let err = session
            .handle(SessionEvent::FrameReceived { generation, text: "not json".to_string() })
            .unwrap_err();
        assert!(!err.is_fatal());

        // The loop continues: the next frame still dispatches.
        let actions = session
            .handle(frame_event(generation, json!({ "type": "message", "user": "U1" })))
            .unwrap();
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn resync_closes_rebootstraps_and_cancels_stale_work() {
        let (mut session, generation) = connected_session();
        session
            .handle(frame_event(
                generation,
                json!({ "type": "team_join", "user": { "id": "U2", "name": "carol" } }),
            ))
            .unwrap();

        let actions = session
            .handle(frame_event(generation, json!({ "type": "team_migration_started" })))
            .unwrap();
        assert_eq!(
            actions,
            vec![
                SessionAction::CloseTransport,
                SessionAction::FetchSnapshot { generation: generation + 1 },
            ]
        );
        assert_eq!(session.state(), ConnState::Bootstrapping);

        // The pre-resync im.open completion is stale and must not mutate
        // the (about to be replaced) cache.
        let actions = session
            .handle(SessionEvent::ImOpened {
                generation,
                user_id: "U2".to_string(),
                im: Im { id: "D9".to_string(), user: "U2".to_string() },
            })
            .unwrap();
        assert!(actions.is_empty());
        assert!(session.cache().resolve_im("U2").is_none());
    }

    #[test]
    fn queue_survives_disconnect_and_drains_after_reconnect() {
        let (mut session, generation) = connected_session();
        session
            .handle(SessionEvent::TransportClosed {
                generation,
                reason: "socket error".to_string(),
            })
            .unwrap();
        assert_eq!(session.state(), ConnState::Disconnected);

        session
            .handle(SessionEvent::SendRequested {
                target: "general".to_string(),
                text: "offline".to_string(),
            })
            .unwrap();
        assert_eq!(session.queued(), 1);

        // Full reconnect cycle under a new generation.
        let actions = session.handle(SessionEvent::Start).unwrap();
        assert_eq!(actions, vec![SessionAction::FetchSnapshot { generation: generation + 1 }]);
        session
            .handle(SessionEvent::BootstrapCompleted {
                generation: generation + 1,
                snapshot: snapshot(),
            })
            .unwrap();
        let actions =
            session.handle(SessionEvent::TransportOpened { generation: generation + 1 }).unwrap();
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            SessionAction::TransportSend { text } => assert!(text.contains("offline")),
            other => unreachable!("expected send, got {other:?}"),
        }
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn ping_is_stamped_and_never_queued() {
        let (mut session, generation) = connected_session();
        let actions = session.handle(SessionEvent::PingRequested).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::TransportSend { text: r#"{"id":0,"type":"ping"}"#.to_string() }]
        );

        session
            .handle(SessionEvent::TransportClosed { generation, reason: "gone".to_string() })
            .unwrap();
        let actions = session.handle(SessionEvent::PingRequested).unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn stale_bootstrap_completion_is_ignored() {
        let (mut session, _) = connected_session();
        let actions = session
            .handle(SessionEvent::BootstrapCompleted { generation: 0, snapshot: snapshot() })
            .unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.state(), ConnState::Connected);
    }
}

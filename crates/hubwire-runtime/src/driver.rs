//! Actor task that owns the session and executes its actions.
//!
//! The driver is the only holder of the `Session`. It consumes commands from
//! client handles and completion events from spawned I/O tasks over one
//! internal channel, feeds them through the state machine, and executes the
//! resulting actions. Cache reads are answered here as request/response
//! commands, so the cache is never aliased outside this task.

use std::{sync::Arc, time::Duration};

use hubwire_client::{
    ChannelRecord, ConnState, EventKind, Im, SendLimits, Session, SessionAction, SessionEvent,
    User, UserSnapshot,
};
use hubwire_proto::{ChatPost, Snapshot, methods};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::{
    Config,
    error::ClientError,
    rest::{RestClient, RestError, check_ok},
    subscriptions::{Subscription, SubscriptionRegistry},
    transport::{Transport, TransportError, TransportEvent, TransportHandle},
};

/// Requests from client handles to the driver.
pub(crate) enum Command {
    Send { target: String, text: String },
    Ping,
    Post { post: ChatPost, reply: oneshot::Sender<Result<Value, RestError>> },
    Request {
        method: String,
        form: Vec<(String, String)>,
        reply: oneshot::Sender<Result<Value, RestError>>,
    },
    ResolveChannel { term: String, reply: oneshot::Sender<Option<ChannelRecord>> },
    ResolveUser { term: String, reply: oneshot::Sender<Option<User>> },
    ResolveIm { term: String, reply: oneshot::Sender<Option<Im>> },
    SelfProfile { reply: oneshot::Sender<Option<UserSnapshot>> },
    Subscribe { kind: Option<EventKind>, reply: oneshot::Sender<Subscription> },
    State { reply: oneshot::Sender<ConnState> },
    SetLimits { limits: SendLimits },
    Reconnect,
    Shutdown,
}

/// Internal driver inputs: session events from I/O tasks, plus the write
/// half of a freshly opened transport.
pub(crate) enum DriverEvent {
    Session(SessionEvent),
    TransportUp { generation: u64, outbound: mpsc::UnboundedSender<String> },
}

pub(crate) struct Driver {
    session: Session,
    rest: Arc<dyn RestClient>,
    transport: Arc<dyn Transport>,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    events_rx: mpsc::UnboundedReceiver<DriverEvent>,
    subscriptions: SubscriptionRegistry,
    outbound: Option<mpsc::UnboundedSender<String>>,
    ready: Option<oneshot::Sender<Result<(), ClientError>>>,
    request_timeout: Option<Duration>,
}

impl Driver {
    pub(crate) fn new(
        config: Config,
        rest: Arc<dyn RestClient>,
        transport: Arc<dyn Transport>,
        commands: mpsc::UnboundedReceiver<Command>,
        ready: oneshot::Sender<Result<(), ClientError>>,
    ) -> Self {
        let mut session = Session::new(config.token, config.policy);
        session.set_limits(config.limits);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            session,
            rest,
            transport,
            commands,
            events_tx,
            events_rx,
            subscriptions: SubscriptionRegistry::default(),
            outbound: None,
            ready: Some(ready),
            request_timeout: config.request_timeout,
        }
    }

    pub(crate) async fn run(mut self) {
        self.dispatch(SessionEvent::Start);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                event = self.events_rx.recv() => match event {
                    Some(DriverEvent::Session(event)) => self.dispatch(event),
                    Some(DriverEvent::TransportUp { generation, outbound }) => {
                        // A handle from a torn-down generation must not be
                        // installed over the current socket.
                        if generation == self.session.generation() {
                            self.outbound = Some(outbound);
                        }
                    },
                    None => break,
                },
            }
        }
        tracing::debug!("driver task exiting");
    }

    /// Feed one event through the state machine and execute the actions.
    fn dispatch(&mut self, event: SessionEvent) {
        let close_reason = match &event {
            SessionEvent::TransportClosed { reason, .. } => Some(reason.clone()),
            _ => None,
        };

        match self.session.handle(event) {
            Ok(actions) => {
                for action in actions {
                    self.execute(action);
                }
            },
            Err(error) if error.is_fatal() => {
                tracing::error!(%error, "session error");
                if let Some(ready) = self.ready.take() {
                    let _ = ready.send(Err(error.into()));
                }
                return;
            },
            Err(error) => {
                tracing::warn!(%error, "dropping malformed frame");
            },
        }

        // Settle the pending connect() once the first lifecycle completes.
        if self.ready.is_some() {
            if self.session.state() == ConnState::Connected {
                if let Some(ready) = self.ready.take() {
                    let _ = ready.send(Ok(()));
                }
            } else if let Some(reason) = close_reason {
                if let Some(ready) = self.ready.take() {
                    let _ =
                        ready.send(Err(TransportError::Connect { reason }.into()));
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send { target, text } => {
                self.dispatch(SessionEvent::SendRequested { target, text });
            },
            Command::Ping => self.dispatch(SessionEvent::PingRequested),
            Command::Post { post, reply } => {
                let form = post.into_form(self.session.token());
                self.spawn_rest(methods::CHAT_POST.to_string(), form, reply);
            },
            Command::Request { method, mut form, reply } => {
                form.push(("token".to_string(), self.session.token().to_string()));
                self.spawn_rest(method, form, reply);
            },
            Command::ResolveChannel { term, reply } => {
                let _ = reply.send(self.session.cache().resolve_channel(&term));
            },
            Command::ResolveUser { term, reply } => {
                let _ = reply.send(self.session.cache().resolve_user(&term).cloned());
            },
            Command::ResolveIm { term, reply } => {
                let _ = reply.send(self.session.cache().resolve_im(&term).cloned());
            },
            Command::SelfProfile { reply } => {
                let _ = reply.send(self.session.cache().self_snapshot());
            },
            Command::Subscribe { kind, reply } => {
                let _ = reply.send(self.subscriptions.register(kind));
            },
            Command::State { reply } => {
                let _ = reply.send(self.session.state());
            },
            Command::SetLimits { limits } => {
                self.dispatch(SessionEvent::LimitsChanged { limits });
            },
            Command::Reconnect => self.dispatch(SessionEvent::Start),
            Command::Shutdown => {},
        }
    }

    fn execute(&mut self, action: SessionAction) {
        match action {
            SessionAction::FetchSnapshot { generation } => self.spawn_bootstrap(generation),
            SessionAction::ConnectTransport { generation, url } => {
                self.spawn_transport(generation, url);
            },
            SessionAction::CloseTransport => {
                // Dropping the write half closes the socket; the reader task
                // reports the close under its (now stale) generation.
                self.outbound = None;
            },
            SessionAction::TransportSend { text } => match &self.outbound {
                Some(outbound) => {
                    if outbound.send(text).is_err() {
                        tracing::warn!("transport write half gone");
                    }
                },
                None => tracing::warn!("transport send with no open transport"),
            },
            SessionAction::OpenIm { generation, user_id } => {
                self.spawn_im_open(generation, user_id);
            },
            SessionAction::Emit { event } => self.subscriptions.emit(&event),
        }
    }

    fn spawn_bootstrap(&self, generation: u64) {
        let rest = Arc::clone(&self.rest);
        let tx = self.events_tx.clone();
        let token = self.session.token().to_string();
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            let form = vec![("token".to_string(), token)];
            let event = match rest_call(rest.as_ref(), timeout, methods::RTM_START, &form).await {
                Ok(value) => match serde_json::from_value::<Snapshot>(value) {
                    Ok(snapshot) => SessionEvent::BootstrapCompleted { generation, snapshot },
                    Err(error) => SessionEvent::BootstrapFailed {
                        generation,
                        reason: format!("malformed snapshot: {error}"),
                    },
                },
                Err(error) => {
                    SessionEvent::BootstrapFailed { generation, reason: error.to_string() }
                },
            };
            let _ = tx.send(DriverEvent::Session(event));
        });
    }

    fn spawn_transport(&self, generation: u64, url: String) {
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let handle = match transport.connect(&url).await {
                Ok(handle) => handle,
                Err(error) => {
                    let _ = tx.send(DriverEvent::Session(SessionEvent::TransportClosed {
                        generation,
                        reason: error.to_string(),
                    }));
                    return;
                },
            };

            let TransportHandle { outbound, mut events } = handle;
            // The write half must be installed before the drain that
            // TransportOpened triggers; channel order guarantees it.
            let _ = tx.send(DriverEvent::TransportUp { generation, outbound });
            let _ =
                tx.send(DriverEvent::Session(SessionEvent::TransportOpened { generation }));

            while let Some(event) = events.recv().await {
                let session_event = match event {
                    TransportEvent::Frame(text) => {
                        SessionEvent::FrameReceived { generation, text }
                    },
                    TransportEvent::Closed { reason } => {
                        let _ = tx.send(DriverEvent::Session(
                            SessionEvent::TransportClosed { generation, reason },
                        ));
                        return;
                    },
                };
                if tx.send(DriverEvent::Session(session_event)).is_err() {
                    return;
                }
            }

            let _ = tx.send(DriverEvent::Session(SessionEvent::TransportClosed {
                generation,
                reason: "transport handle dropped".to_string(),
            }));
        });
    }

    fn spawn_im_open(&self, generation: u64, user_id: String) {
        let rest = Arc::clone(&self.rest);
        let tx = self.events_tx.clone();
        let token = self.session.token().to_string();
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            let form =
                vec![("token".to_string(), token), ("user".to_string(), user_id.clone())];
            let event = match rest_call(rest.as_ref(), timeout, methods::IM_OPEN, &form).await {
                Ok(value) => match value.pointer("/channel/id").and_then(Value::as_str) {
                    Some(id) => SessionEvent::ImOpened {
                        generation,
                        user_id: user_id.clone(),
                        im: Im { id: id.to_string(), user: user_id },
                    },
                    None => SessionEvent::ImOpenFailed {
                        generation,
                        user_id,
                        reason: "response carried no channel id".to_string(),
                    },
                },
                Err(error) => SessionEvent::ImOpenFailed {
                    generation,
                    user_id,
                    reason: error.to_string(),
                },
            };
            let _ = tx.send(DriverEvent::Session(event));
        });
    }

    /// Run a caller-initiated REST call off the actor, replying directly.
    fn spawn_rest(
        &self,
        method: String,
        form: Vec<(String, String)>,
        reply: oneshot::Sender<Result<Value, RestError>>,
    ) {
        let rest = Arc::clone(&self.rest);
        let timeout = self.request_timeout;
        tokio::spawn(async move {
            let result = rest_call(rest.as_ref(), timeout, &method, &form).await;
            let _ = reply.send(result);
        });
    }
}

/// REST call with the configured timeout and `ok` envelope check.
async fn rest_call(
    rest: &dyn RestClient,
    timeout: Option<Duration>,
    method: &str,
    form: &[(String, String)],
) -> Result<Value, RestError> {
    let value = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, rest.call(method, form))
            .await
            .map_err(|_| RestError::Timeout)??,
        None => rest.call(method, form).await?,
    };
    check_ok(method, value)
}

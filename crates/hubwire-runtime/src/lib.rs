//! Production driver and public API for the Hubwire session core.
//!
//! The session state machine in `hubwire-client` performs no I/O. This crate
//! runs it: a single actor task owns the session, executes its actions
//! against a [`RestClient`] and a [`Transport`], and answers cache reads as
//! request/response commands so the mirrored state is never aliased across
//! tasks.
//!
//! ```text
//! hubwire-runtime
//!   ├─ Client          (cloneable command handle)
//!   ├─ Driver          (actor task owning the Session)
//!   ├─ HttpRest        (reqwest RestClient impl)
//!   ├─ WsTransport     (tokio-tungstenite Transport impl)
//!   ├─ Subscription    (per-kind or wildcard event receiver)
//!   └─ DuplexChannel   (paired send/receive message surface)
//! ```
//!
//! Alternate implementations of the two I/O seams can be injected with
//! [`Client::connect_with`]; the test harness uses this to run the full
//! stack without a network.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod duplex;
mod error;
mod rest;
mod subscriptions;
mod transport;

use std::{sync::Arc, time::Duration};

use driver::{Command, Driver};
pub use duplex::DuplexChannel;
pub use error::ClientError;
pub use hubwire_client::{
    ChannelRecord, ConnState, Event, EventKind, FilterPolicy, Im, SendLimits, SessionError, User,
    UserSnapshot,
};
pub use hubwire_proto::ChatPost;
pub use rest::{HttpRest, RestClient, RestError, check_ok};
use serde_json::Value;
pub use subscriptions::Subscription;
use tokio::sync::{mpsc, oneshot};
pub use transport::{Transport, TransportError, TransportEvent, TransportHandle, WsTransport};

/// Default REST root of the hosted service.
const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Opaque credential sent with every REST call.
    pub token: String,
    /// Inbound filter flags, all default filter-out.
    pub policy: FilterPolicy,
    /// Outbound validation caps.
    pub limits: SendLimits,
    /// REST root URL.
    pub base_url: String,
    /// Optional per-request REST timeout. No timeout unless set.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Configuration with defaults for everything but the token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            policy: FilterPolicy::default(),
            limits: SendLimits::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

/// Handle to a running session.
///
/// Cloneable; all clones talk to the same driver task. The session shuts
/// down when every handle (and every [`DuplexChannel`]) is dropped, or
/// explicitly via [`Client::shutdown`].
#[derive(Debug, Clone)]
pub struct Client {
    commands: mpsc::UnboundedSender<Command>,
}

impl Client {
    /// Bootstrap a session and connect its streaming transport.
    ///
    /// Resolves once the transport is open (the `init` lifecycle event has
    /// already fired by then).
    ///
    /// # Errors
    ///
    /// Returns the bootstrap or transport failure; the session never
    /// reaches Connected on error.
    pub async fn connect(config: Config) -> Result<Self, ClientError> {
        let rest = Arc::new(HttpRest::new(&config.base_url)?);
        let transport = Arc::new(WsTransport);
        Self::connect_with(config, rest, transport).await
    }

    /// [`Client::connect`] with injected I/O implementations.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Client::connect`].
    pub async fn connect_with(
        config: Config,
        rest: Arc<dyn RestClient>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (ready, connected) = oneshot::channel();

        let driver = Driver::new(config, rest, transport, command_rx, ready);
        tokio::spawn(driver.run());

        connected.await.map_err(|_| ClientError::Closed)??;
        Ok(Self { commands })
    }

    /// Send `text` to `target` (channel/group/im/user name or id) over the
    /// socket. Queued FIFO while the transport is down.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone. Validation
    /// failures and unresolvable targets are logged and dropped, not
    /// returned.
    pub fn send(
        &self,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.command(Command::Send { target: target.into(), text: text.into() })
    }

    /// Send a keepalive ping. Dropped, never queued, while disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub fn ping(&self) -> Result<(), ClientError> {
        self.command(Command::Ping)
    }

    /// Post a rich message over REST and return the response envelope.
    ///
    /// # Errors
    ///
    /// Returns the REST failure, or [`ClientError::Closed`] if the driver
    /// is gone.
    pub async fn post(&self, post: ChatPost) -> Result<Value, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Post { post, reply })?;
        Ok(response.await.map_err(|_| ClientError::Closed)??)
    }

    /// Call an arbitrary REST method with the token injected.
    ///
    /// # Errors
    ///
    /// Returns the REST failure, or [`ClientError::Closed`] if the driver
    /// is gone.
    pub async fn request(
        &self,
        method: impl Into<String>,
        form: Vec<(String, String)>,
    ) -> Result<Value, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Request { method: method.into(), form, reply })?;
        Ok(response.await.map_err(|_| ClientError::Closed)??)
    }

    /// Resolve a channel-like destination by name or id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn resolve_channel(
        &self,
        term: impl Into<String>,
    ) -> Result<Option<ChannelRecord>, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::ResolveChannel { term: term.into(), reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// Resolve a user by name, then id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn resolve_user(
        &self,
        term: impl Into<String>,
    ) -> Result<Option<User>, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::ResolveUser { term: term.into(), reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// Resolve a direct-message session by user, name, or id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn resolve_im(&self, term: impl Into<String>) -> Result<Option<Im>, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::ResolveIm { term: term.into(), reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// The session's own identity snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn self_profile(&self) -> Result<Option<UserSnapshot>, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::SelfProfile { reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// Subscribe to one event kind.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn subscribe(&self, kind: EventKind) -> Result<Subscription, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Subscribe { kind: Some(kind), reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// Subscribe to every emission, delivered before any typed subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn subscribe_all(&self) -> Result<Subscription, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Subscribe { kind: None, reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// Open the duplex message surface: sends paired with the stream of
    /// enriched message emissions.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn stream(&self) -> Result<DuplexChannel, ClientError> {
        let messages = self.subscribe(EventKind::Message).await?;
        Ok(DuplexChannel::new(self.commands.clone(), messages))
    }

    /// Current connection state.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub async fn state(&self) -> Result<ConnState, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::State { reply })?;
        response.await.map_err(|_| ClientError::Closed)
    }

    /// Replace the outbound validation caps. Queued sends are re-validated
    /// against the new caps when they drain.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub fn set_limits(&self, limits: SendLimits) -> Result<(), ClientError> {
        self.command(Command::SetLimits { limits })
    }

    /// Start a fresh bootstrap after a transport loss. Queued sends are
    /// kept and drain once the new transport opens. No-op error if a
    /// session is still active.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the driver is gone.
    pub fn reconnect(&self) -> Result<(), ClientError> {
        self.command(Command::Reconnect)
    }

    /// Stop the driver task. In-flight REST calls resolve with
    /// [`ClientError::Closed`].
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Closed)
    }
}

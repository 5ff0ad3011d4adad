//! Programmable in-memory I/O for driving the full client stack without a
//! network.
//!
//! [`TestTransport`] implements both [`RestClient`] and [`Transport`], so one
//! instance injected through `Client::connect_with` replaces the entire I/O
//! surface: REST replies are programmed per method with full call recording,
//! inbound frames are injected directly, and everything the client writes to
//! the socket is captured for assertion. Filtering, enrichment, and
//! validation behave exactly as they do over a real network.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use hubwire_runtime::{
    RestClient, RestError, Transport, TransportError, TransportEvent, TransportHandle,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
enum Reply {
    Value(Value),
    Fail(String),
}

#[derive(Debug, Default)]
struct Inner {
    replies: HashMap<String, Reply>,
    calls: Vec<(String, Vec<(String, String)>)>,
    /// Event sender of the most recent connection.
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    connected_urls: Vec<String>,
    refuse_connect: Option<String>,
}

/// In-memory REST endpoint and streaming transport in one.
pub struct TestTransport {
    inner: Mutex<Inner>,
    sent_tx: mpsc::UnboundedSender<String>,
    sent_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Default for TestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTransport {
    /// Transport with no programmed replies.
    pub fn new() -> Self {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        Self {
            inner: Mutex::new(Inner::default()),
            sent_tx,
            sent_rx: tokio::sync::Mutex::new(sent_rx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Program `method` to answer with `value`.
    pub fn respond(&self, method: &str, value: Value) {
        self.lock().replies.insert(method.to_string(), Reply::Value(value));
    }

    /// Program `method` to fail at the HTTP level.
    pub fn fail(&self, method: &str, reason: &str) {
        self.lock().replies.insert(method.to_string(), Reply::Fail(reason.to_string()));
    }

    /// Make the next `connect` fail.
    pub fn refuse_connect(&self, reason: &str) {
        self.lock().refuse_connect = Some(reason.to_string());
    }

    /// Recorded forms for every call to `method`, in call order.
    pub fn calls(&self, method: &str) -> Vec<Vec<(String, String)>> {
        self.lock()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, form)| form.clone())
            .collect()
    }

    /// Number of calls made to `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|(m, _)| m == method).count()
    }

    /// URLs the client connected its transport to.
    pub fn connected_urls(&self) -> Vec<String> {
        self.lock().connected_urls.clone()
    }

    /// Deliver one inbound frame on the live connection.
    ///
    /// Returns false if no connection is open.
    pub fn inject(&self, frame: &Value) -> bool {
        match &self.lock().events {
            Some(events) => events.send(TransportEvent::Frame(frame.to_string())).is_ok(),
            None => false,
        }
    }

    /// Close the live connection from the remote side.
    ///
    /// Returns false if no connection is open.
    pub fn close(&self, reason: &str) -> bool {
        match self.lock().events.take() {
            Some(events) => events
                .send(TransportEvent::Closed { reason: reason.to_string() })
                .is_ok(),
            None => false,
        }
    }

    /// Wait up to one second for the next frame the client transmitted.
    pub async fn next_sent(&self) -> Option<String> {
        let mut sent = self.sent_rx.lock().await;
        tokio::time::timeout(Duration::from_secs(1), sent.recv()).await.ok().flatten()
    }

    /// Frames transmitted so far, without waiting.
    pub async fn drain_sent(&self) -> Vec<String> {
        let mut sent = self.sent_rx.lock().await;
        let mut frames = Vec::new();
        while let Ok(frame) = sent.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

#[async_trait]
impl RestClient for TestTransport {
    async fn call(&self, method: &str, form: &[(String, String)]) -> Result<Value, RestError> {
        let reply = {
            let mut inner = self.lock();
            inner.calls.push((method.to_string(), form.to_vec()));
            inner.replies.get(method).cloned()
        };
        match reply {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::Fail(reason)) => Err(RestError::Http { reason }),
            None => Err(RestError::Http { reason: format!("no reply programmed for {method}") }),
        }
    }
}

#[async_trait]
impl Transport for TestTransport {
    async fn connect(&self, url: &str) -> Result<TransportHandle, TransportError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        {
            let mut inner = self.lock();
            if let Some(reason) = inner.refuse_connect.take() {
                return Err(TransportError::Connect { reason });
            }
            inner.connected_urls.push(url.to_string());
            inner.events = Some(event_tx);
        }

        // Forward everything the client writes into the capture channel.
        let sent_tx = self.sent_tx.clone();
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let _ = sent_tx.send(frame);
            }
        });

        Ok(TransportHandle { outbound: outbound_tx, events: event_rx })
    }
}

/// A small workspace snapshot fixture: self `U0/me`, users `U123/bob` and
/// `U9/alice`, channel `C123/general`, group `G1/core`, and an open im `D1`
/// with alice.
pub fn workspace_snapshot() -> Value {
    json!({
        "ok": true,
        "url": "wss://hub.test/socket",
        "self": { "id": "U0", "name": "me" },
        "users": [
            { "id": "U0", "name": "me", "is_admin": true },
            { "id": "U123", "name": "bob", "real_name": "Bob B" },
            { "id": "U9", "name": "alice" }
        ],
        "channels": [
            { "id": "C123", "name": "general" }
        ],
        "groups": [
            { "id": "G1", "name": "core" }
        ],
        "ims": [
            { "id": "D1", "user": "U9" }
        ]
    })
}

//! Subscriber registry and the receiving half handed to callers.

use std::{
    collections::HashMap,
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use hubwire_client::{Event, EventKind};
use tokio::sync::mpsc;

/// Receiving half of a subscription.
///
/// Yields enriched events in emission order. Implements [`Stream`]; dropping
/// it unregisters the subscription on the next emission.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<Event>,
}

impl Subscription {
    /// Wait for the next event. `None` after the client shuts down.
    pub async fn next(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        self.events.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.poll_recv(cx)
    }
}

/// Wildcard and per-kind subscriber lists.
///
/// Emission order is wildcard list first, then the kind-specific list, both
/// in registration order.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    wildcard: Vec<mpsc::UnboundedSender<Event>>,
    typed: HashMap<EventKind, Vec<mpsc::UnboundedSender<Event>>>,
}

impl SubscriptionRegistry {
    /// Register a subscriber; `None` subscribes to every event.
    pub(crate) fn register(&mut self, kind: Option<EventKind>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        match kind {
            None => self.wildcard.push(tx),
            Some(kind) => self.typed.entry(kind).or_default().push(tx),
        }
        Subscription { events: rx }
    }

    /// Deliver one event, pruning dropped subscribers.
    pub(crate) fn emit(&mut self, event: &Event) {
        self.wildcard.retain(|tx| tx.send(event.clone()).is_ok());
        if let Some(list) = self.typed.get_mut(&event.kind) {
            list.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

//! Duplex message stream, the primary integration surface.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use hubwire_client::Event;
use hubwire_proto::ChatPost;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::{driver::Command, error::ClientError, subscriptions::Subscription};

/// Bidirectional message surface over one client.
///
/// The write side routes `send` through the outbound queue and `post`
/// through the chat REST call; the read side yields every enriched message
/// emission. Created by [`Client::stream`](crate::Client::stream).
#[derive(Debug)]
pub struct DuplexChannel {
    commands: mpsc::UnboundedSender<Command>,
    messages: Subscription,
}

impl DuplexChannel {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        messages: Subscription,
    ) -> Self {
        Self { commands, messages }
    }

    /// Send `text` to `target` over the socket, queueing while offline.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the client has shut down.
    pub fn send(
        &self,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.commands
            .send(Command::Send { target: target.into(), text: text.into() })
            .map_err(|_| ClientError::Closed)
    }

    /// Post a rich message over REST and return the response envelope.
    ///
    /// # Errors
    ///
    /// Returns the REST failure, or [`ClientError::Closed`] if the client
    /// has shut down.
    pub async fn post(&self, post: ChatPost) -> Result<Value, ClientError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Post { post, reply })
            .map_err(|_| ClientError::Closed)?;
        Ok(response.await.map_err(|_| ClientError::Closed)??)
    }

    /// Wait for the next enriched message. `None` after shutdown.
    pub async fn next(&mut self) -> Option<Event> {
        self.messages.next().await
    }
}

impl Stream for DuplexChannel {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().messages).poll_next(cx)
    }
}

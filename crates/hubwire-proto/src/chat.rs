//! Rich-payload REST post.
//!
//! Structured payloads (attachments) cannot ride the socket; they go through
//! the `chat.postMessage` REST call with the attachments JSON-encoded into a
//! single form field, as the service requires.

use serde_json::Value;

/// A rich message posted over REST instead of the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPost {
    /// Destination channel id.
    pub channel: String,
    /// Message text.
    pub text: String,
    /// Structured attachments, serialized to a string at transmission.
    pub attachments: Option<Value>,
}

impl ChatPost {
    /// A plain post without attachments.
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self { channel: channel.into(), text: text.into(), attachments: None }
    }

    /// Attach structured data.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Value) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// Render the form body, injecting the session token.
    pub fn into_form(self, token: &str) -> Vec<(String, String)> {
        let mut form = vec![
            ("token".to_string(), token.to_string()),
            ("channel".to_string(), self.channel),
            ("text".to_string(), self.text),
        ];
        if let Some(attachments) = self.attachments {
            let encoded = match attachments {
                // Already a string: pass through untouched.
                Value::String(s) => s,
                other => serde_json::to_string(&other).unwrap_or_default(),
            };
            form.push(("attachments".to_string(), encoded));
        }
        form
    }
}

//! Outbound message queue.
//!
//! Buffers sends issued while the session is not Connected and validates
//! every outbound frame against the size caps. The queue owns the monotonic
//! message-id counter; ids are stamped at the moment of transmission, never
//! at enqueue time, and validation always runs on the id-less rendering so
//! an entry is judged the same way at enqueue and at drain.

use std::collections::VecDeque;

use hubwire_proto::OutboundMessage;

/// Outbound validation caps.
///
/// Runtime-adjustable: queued entries are re-validated against the current
/// caps when the queue drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendLimits {
    /// Character cap applied when the destination is not a direct-message
    /// channel.
    pub max_text_chars: usize,
    /// Byte cap applied to every destination kind.
    pub max_frame_bytes: usize,
}

impl Default for SendLimits {
    fn default() -> Self {
        Self { max_text_chars: 4000, max_frame_bytes: 16_384 }
    }
}

/// A resolved outbound destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Channel id to address the frame to.
    pub id: String,
    /// Whether the destination is a direct-message channel.
    pub is_im: bool,
}

#[derive(Debug)]
struct PendingSend {
    channel_id: String,
    text: String,
    is_im: bool,
}

/// FIFO queue of validated pending sends.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: VecDeque<PendingSend>,
    next_id: u64,
    limits: SendLimits,
}

impl OutboundQueue {
    /// Create an empty queue with default caps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the validation caps.
    pub fn set_limits(&mut self, limits: SendLimits) {
        self.limits = limits;
    }

    /// Number of queued sends.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Validate and either transmit or enqueue one send.
    ///
    /// Returns the rendered, id-stamped frame when `connected`; `None` when
    /// the send was queued or dropped by validation.
    pub fn submit(&mut self, dest: &Destination, text: &str, connected: bool) -> Option<String> {
        let probe = OutboundMessage::message(&dest.id, text).render(None);
        if !self.admits(&probe, dest.is_im) {
            return None;
        }

        if connected {
            let id = self.assign_id();
            Some(OutboundMessage::message(&dest.id, text).render(Some(id)))
        } else {
            self.pending.push_back(PendingSend {
                channel_id: dest.id.clone(),
                text: text.to_string(),
                is_im: dest.is_im,
            });
            None
        }
    }

    /// Drain the whole queue in enqueue order for transmission.
    ///
    /// Each entry is re-validated against the current caps and id-stamped
    /// here; entries the caps no longer admit are dropped.
    pub fn drain(&mut self) -> Vec<String> {
        let mut frames = Vec::with_capacity(self.pending.len());
        while let Some(entry) = self.pending.pop_front() {
            let probe = OutboundMessage::message(&entry.channel_id, &entry.text).render(None);
            if !self.admits(&probe, entry.is_im) {
                continue;
            }
            let id = self.assign_id();
            frames.push(OutboundMessage::message(&entry.channel_id, &entry.text).render(Some(id)));
        }
        frames
    }

    /// Stamp the next monotonic message id.
    pub fn assign_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn admits(&self, rendered: &str, is_im: bool) -> bool {
        if !is_im && rendered.chars().count() > self.limits.max_text_chars {
            tracing::warn!(
                chars = rendered.chars().count(),
                cap = self.limits.max_text_chars,
                "dropping oversize message"
            );
            return false;
        }
        if rendered.len() > self.limits.max_frame_bytes {
            tracing::warn!(
                bytes = rendered.len(),
                cap = self.limits.max_frame_bytes,
                "dropping oversize frame"
            );
            return false;
        }
        true
    }
}

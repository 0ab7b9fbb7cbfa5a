//! The rate-limited send path.
//!
//! Every line the bot writes goes through an [`Outbound`] handle: protocol
//! replies from the read loop, chat replies from detached sub-command tasks
//! and moderation actions (`/delete`, `/ban`) alike. Each send spends one
//! token of the shared [`TokenBucket`] before it is queued for the writer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::OutboundError;
use crate::event::{Category, DisplayEvent, EventSink};
use crate::line;
use crate::ratelimit::TokenBucket;

/// Cloneable handle onto the connection's outbound queue.
#[derive(Clone)]
pub struct Outbound {
    limiter: Arc<TokenBucket>,
    tx: mpsc::UnboundedSender<String>,
    events: Arc<dyn EventSink>,
}

impl Outbound {
    /// Create a handle and the receiving end the writer drains.
    pub fn new(
        limiter: Arc<TokenBucket>,
        events: Arc<dyn EventSink>,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                limiter,
                tx,
                events,
            },
            rx,
        )
    }

    pub fn limiter(&self) -> &Arc<TokenBucket> {
        &self.limiter
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Send one protocol line (without terminator).
    pub async fn send_raw(&self, line: &str) -> Result<(), OutboundError> {
        let event = DisplayEvent::new(Category::Outbound, line);
        self.send_line(line, event).await
    }

    /// Send a chat message to `channel`.
    pub async fn privmsg(&self, channel: &str, text: &str) -> Result<(), OutboundError> {
        let line = format!("PRIVMSG {} :{}", channel, text);
        let event = DisplayEvent::new(Category::Outbound, text).with_channel(channel);
        self.send_line(&line, event).await
    }

    /// Send `<command> <secret>` with the secret masked in the display record.
    pub async fn send_masked(&self, command: &str, secret: &str) -> Result<(), OutboundError> {
        let line = format!("{} {}", command, secret);
        let mask = "*".repeat(secret.chars().count());
        let event = DisplayEvent::new(Category::Outbound, format!("{} {}", command, mask));
        self.send_line(&line, event).await
    }

    async fn send_line(&self, line: &str, event: DisplayEvent) -> Result<(), OutboundError> {
        let line = line::sanitize(line)?;
        if self.tx.is_closed() {
            return Err(OutboundError::Closed);
        }

        self.limiter.acquire(1).await?;

        trace!(line = event.text.as_str(), "queueing outbound line");
        self.events.emit(event);
        self.tx.send(line).map_err(|_| OutboundError::Closed)
    }
}

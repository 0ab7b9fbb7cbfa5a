//! Display events.
//!
//! Everything a human operator might want to see (accepted chat lines,
//! outbound sends, notices, warnings) is emitted as a structured
//! [`DisplayEvent`] to an [`EventSink`]. The core never formats for a
//! particular presentation; a console, a log file or a GUI decide that.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What kind of record this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// A chat message in a channel.
    Chat,
    /// A private message addressed to the bot.
    Whisper,
    /// A server notice.
    Notice,
    /// A line the bot sent.
    Outbound,
    /// Any inbound line, shown verbatim when verbose logging is enabled.
    Raw,
    Info,
    Warning,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Chat => "chat",
            Category::Whisper => "whisper",
            Category::Notice => "notice",
            Category::Outbound => "outbound",
            Category::Raw => "raw",
            Category::Info => "info",
            Category::Warning => "warning",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured display record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayEvent {
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub channel: Option<String>,
    pub sender: Option<String>,
    pub text: String,
}

impl DisplayEvent {
    /// A record stamped with the current time and no channel or sender.
    pub fn new(category: Category, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            channel: None,
            sender: None,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Category::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Category::Warning, text)
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }
}

/// Consumer of display records.
///
/// Implementations must not block: sinks are called from the read loop and
/// from detached sub-command tasks alike.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DisplayEvent);
}

/// Renders display records as `tracing` events under the
/// `volpesbot::display` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DisplayEvent) {
        let channel = event.channel.as_deref().unwrap_or("");
        let sender = event.sender.as_deref().unwrap_or("");
        match event.category {
            Category::Warning => warn!(
                target: "volpesbot::display",
                category = %event.category,
                channel,
                sender,
                "{}",
                event.text
            ),
            _ => info!(
                target: "volpesbot::display",
                category = %event.category,
                channel,
                sender,
                "{}",
                event.text
            ),
        }
    }
}

/// Forwards display records over an unbounded channel, for a front end
/// running on its own task.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DisplayEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DisplayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: DisplayEvent) {
        // A closed front end is not the bot's problem.
        let _ = self.tx.send(event);
    }
}

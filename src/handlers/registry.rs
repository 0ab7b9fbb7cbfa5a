//! Command-name to handler mapping.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, debug_span, trace, Instrument};

use super::{
    Context, EndOfMotdHandler, Handler, HandlerResult, NoticeHandler, PartHandler, PingHandler,
    PrivmsgHandler, ReconnectHandler, WhisperHandler,
};
use crate::message::Message;

struct Entry {
    handler: Box<dyn Handler>,
    count: AtomicU64,
}

/// Registry of protocol command handlers.
///
/// Built once at startup and read-only afterwards. Lookup is by the exact,
/// case-sensitive command token.
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Entry>,
    /// Unhandled commands still worth a debug log line.
    log_unhandled: HashSet<String>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            log_unhandled: HashSet::new(),
        }
    }

    /// A registry with every built-in handler registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Connection upkeep
        registry.register("PING", PingHandler);
        registry.register("376", EndOfMotdHandler);
        registry.register("RECONNECT", ReconnectHandler);

        // Chat
        registry.register("PRIVMSG", PrivmsgHandler);
        registry.register("WHISPER", WhisperHandler);
        registry.register("NOTICE", NoticeHandler);
        registry.register("PART", PartHandler);

        registry
    }

    /// Register `handler` for `command`, replacing any previous one.
    pub fn register(&mut self, command: &'static str, handler: impl Handler + 'static) {
        self.handlers.insert(
            command,
            Entry {
                handler: Box::new(handler),
                count: AtomicU64::new(0),
            },
        );
    }

    /// Set the unhandled commands that are logged instead of dropped
    /// silently.
    pub fn log_unhandled<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_unhandled = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_registered(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// How often each handler ran, busiest first. Unused handlers are left
    /// out.
    pub fn stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .handlers
            .iter()
            .map(|(cmd, entry)| (*cmd, entry.count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Dispatch a message to its handler. A miss is not an error.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(entry) = self.handlers.get(msg.command.as_str()) else {
            if self.log_unhandled.contains(&msg.command) {
                debug!(command = %msg.command, raw = %msg, "unhandled command");
            } else {
                trace!(command = %msg.command, "no handler");
            }
            return Ok(());
        };

        entry.count.fetch_add(1, Ordering::Relaxed);

        let span = debug_span!("handle", command = %msg.command, channel = %msg.channel);
        entry.handler.handle(ctx, msg).instrument(span).await
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

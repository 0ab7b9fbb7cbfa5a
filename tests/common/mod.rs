//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use volpesbot::config::{BotConfig, ConfigError, ConfigStore};
use volpesbot::event::{DisplayEvent, EventSink};
use volpesbot::{Bot, Exit};

pub const BOT: &str = "volpesbot";
pub const OWNER: &str = "grayfox96";

/// Records every display event.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DisplayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Keeps the configuration in memory and counts saves.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<BotConfig>>,
}

impl MemoryStore {
    pub fn saves(&self) -> Vec<BotConfig> {
        self.saved.lock().unwrap().clone()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<BotConfig, ConfigError> {
        self.saved
            .lock()
            .unwrap()
            .last()
            .cloned()
            .ok_or(ConfigError::Missing("config"))
    }

    fn save(&self, config: &BotConfig) -> Result<(), ConfigError> {
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}

pub fn config() -> BotConfig {
    BotConfig::bootstrap(BOT, OWNER, "oauth:secret", "!")
}

pub struct Harness {
    pub bot: Bot,
    pub rx: mpsc::UnboundedReceiver<String>,
    pub sink: RecordingSink,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: BotConfig) -> Self {
        let sink = RecordingSink::default();
        let store = Arc::new(MemoryStore::default());
        let mut bot = Bot::new(config, store.clone(), Arc::new(sink.clone())).unwrap();
        let rx = bot.take_outbound().unwrap();
        Self {
            bot,
            rx,
            sink,
            store,
        }
    }

    /// A harness that has already joined its startup channels.
    pub async fn joined() -> Self {
        Self::joined_with(config()).await
    }

    pub async fn joined_with(config: BotConfig) -> Self {
        let mut harness = Self::with_config(config);
        harness.feed(":tmi.twitch.tv 376 volpesbot :>").await;
        assert_eq!(harness.sent(), vec!["JOIN #grayfox96,#volpesbot"]);
        harness
    }

    pub async fn feed(&mut self, line: &str) -> Option<Exit> {
        self.bot.handle_line(line).await
    }

    /// Everything queued so far.
    pub fn sent(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Wait for the next queued line, for output from detached commands.
    pub async fn next_sent(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(30), self.rx.recv())
            .await
            .expect("no outbound line in time")
            .expect("outbound queue closed")
    }
}

/// A chat line from `nick` in `channel` carrying `badges`.
pub fn chat(nick: &str, badges: &str, channel: &str, text: &str) -> String {
    format!(
        "@badges={badges};display-name={nick};id=msg-1;tmi-sent-ts=1616874384402 :{nick}!{nick}@{nick}.tmi.twitch.tv PRIVMSG {channel} :{text}"
    )
}

//! Channel membership and session state.
//!
//! [`Session`] owns the configuration snapshot and the set of joined
//! channels. Like the handshake machine it grew out of, it performs no I/O:
//! [`Session::join`] and [`Session::part`] update state and hand back the
//! protocol line the caller must send.
//!
//! # Example
//!
//! ```
//! use volpesbot::config::BotConfig;
//! use volpesbot::session::{JoinOutcome, Session};
//!
//! let config = BotConfig::bootstrap("volpesbot", "grayfox96", "oauth:x", "!");
//! let mut session = Session::new(config).unwrap();
//!
//! assert_eq!(
//!     session.join_startup().unwrap().as_deref(),
//!     Some("JOIN #grayfox96,#volpesbot")
//! );
//! assert_eq!(session.join("#grayfox96").unwrap(), JoinOutcome::AlreadyJoined);
//! ```

mod channel;

pub use channel::ChannelState;

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{channel_key, BotConfig, ChannelConfig, ConfigError};
use crate::moderation::{self, ChannelRules};

/// Result of [`Session::join`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    AlreadyJoined,
    /// The channel is now tracked; `command` must be sent.
    Joined { command: String },
}

/// Result of [`Session::part`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartOutcome {
    NotJoined,
    /// The channel is no longer tracked; `command` must be sent.
    Parted { command: String },
}

/// Session state of one connection.
#[derive(Debug)]
pub struct Session {
    config: BotConfig,
    channels: BTreeMap<String, ChannelState>,
    mention: Regex,
    started: Instant,
}

impl Session {
    pub fn new(config: BotConfig) -> Result<Self, ConfigError> {
        let nick = config.bot.bot_nick.clone();
        let mention = moderation::mention_pattern(&nick).map_err(|source| {
            ConfigError::InvalidPattern {
                channel: channel_key(&nick),
                key: "bot_nick",
                source,
            }
        })?;

        Ok(Self {
            config,
            channels: BTreeMap::new(),
            mention,
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn nick(&self) -> &str {
        &self.config.bot.bot_nick
    }

    pub fn own_channel(&self) -> String {
        self.config.own_channel()
    }

    /// Returns `true` when `text` mentions the bot as `@nick`.
    pub fn mentions_bot(&self, text: &str) -> bool {
        self.mention.is_match(text)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelState> {
        self.channels.get(name)
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut ChannelState> {
        self.channels.get_mut(name)
    }

    pub fn is_joined(&self, name: &str) -> bool {
        self.channels.contains_key(&channel_key(name))
    }

    /// Joined channels in name order.
    pub fn joined(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.keys().map(String::as_str)
    }

    /// Track every channel marked `connect_on_startup` and return a single
    /// batched `JOIN` naming the ones not tracked yet.
    pub fn join_startup(&mut self) -> Result<Option<String>, ConfigError> {
        let pending: Vec<String> = self
            .config
            .channels
            .iter()
            .filter(|(name, section)| section.connect_on_startup && !self.channels.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect();

        if pending.is_empty() {
            debug!("no startup channels to join");
            return Ok(None);
        }

        for name in &pending {
            let state = self.materialize(name)?;
            self.channels.insert(name.clone(), state);
        }

        info!(channels = ?pending, "joining startup channels");
        Ok(Some(format!("JOIN {}", pending.join(","))))
    }

    /// Join one channel and remember it for the next start.
    pub fn join(&mut self, name: &str) -> Result<JoinOutcome, ConfigError> {
        let key = channel_key(name);
        if self.channels.contains_key(&key) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        self.config
            .channels
            .entry(key.clone())
            .or_insert_with(ChannelConfig::default)
            .connect_on_startup = true;

        let state = self.materialize(&key)?;
        self.channels.insert(key.clone(), state);

        info!(channel = %key, "joined channel");
        Ok(JoinOutcome::Joined {
            command: format!("JOIN {}", key),
        })
    }

    /// Leave one channel and stop joining it at startup.
    pub fn part(&mut self, name: &str) -> PartOutcome {
        let key = channel_key(name);
        if self.channels.remove(&key).is_none() {
            return PartOutcome::NotJoined;
        }

        if let Some(section) = self.config.channels.get_mut(&key) {
            section.connect_on_startup = false;
        }

        info!(channel = %key, "parted channel");
        PartOutcome::Parted {
            command: format!("PART {}", key),
        }
    }

    fn materialize(&self, key: &str) -> Result<ChannelState, ConfigError> {
        let rules = match self.config.channels.get(key) {
            Some(section) => ChannelRules::compile(key, section)?,
            None => ChannelRules::none(),
        };
        Ok(ChannelState::new(key, self.config.trigger_for(key), rules))
    }
}

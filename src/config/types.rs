//! Configuration document and validation.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LimiterError;
use crate::moderation::ChannelRules;
use crate::ratelimit::TokenBucket;

/// Environment variable that overrides `bot.bot_password` without it ever
/// being written back to disk.
pub const PASSWORD_ENV: &str = "VOLPESBOT_PASSWORD";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid `{key}` pattern for {channel}: {source}")]
    InvalidPattern {
        channel: String,
        key: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("invalid rate limit: {0}")]
    RateLimit(#[from] LimiterError),
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub bot: BotSettings,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Per-channel sections, keyed by lowercase `#channel`.
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
    #[serde(skip)]
    password_override: Option<String>,
}

/// Global `[bot]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bot_nick: String,
    /// Username sent in `USER`. Falls back to the nick when empty.
    #[serde(default)]
    pub bot_user: String,
    /// Real name sent in `USER`. Falls back to the nick when empty.
    #[serde(default)]
    pub bot_name: String,
    #[serde(default)]
    pub bot_owner: String,
    #[serde(default)]
    pub bot_password: String,
    /// Trigger used by channels that do not set their own.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default)]
    pub verbose_log: bool,
    #[serde(default = "default_banlist_path")]
    pub banlist_path: String,
    /// Unhandled commands that are still shown when `verbose_log` is on.
    #[serde(default)]
    pub log_unhandled: Vec<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            bot_nick: String::new(),
            bot_user: String::new(),
            bot_name: String::new(),
            bot_owner: String::new(),
            bot_password: String::new(),
            trigger: default_trigger(),
            verbose_log: false,
            banlist_path: default_banlist_path(),
            log_unhandled: Vec::new(),
        }
    }
}

/// `[rate_limit]` section: `capacity` lines per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Build the connection's token bucket.
    pub fn bucket(&self) -> Result<TokenBucket, LimiterError> {
        TokenBucket::new(self.capacity, Duration::from_secs(self.window_secs))
    }
}

/// One `[channels."#name"]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub connect_on_startup: bool,
    /// Overrides `bot.trigger` for this channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// Regex; matching messages are deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_phrases: Option<String>,
    #[serde(default)]
    pub block_urls: bool,
    /// Regex alternation of emotes the bot repeats back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_emotes: Option<String>,
    /// Seconds between two repeats of the same emote.
    #[serde(default = "default_mime_cooldown")]
    pub mime_emotes_cooldown: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_on_startup: false,
            trigger: None,
            banned_phrases: None,
            block_urls: false,
            mime_emotes: None,
            mime_emotes_cooldown: default_mime_cooldown(),
        }
    }
}

fn default_server() -> String {
    "irc.chat.twitch.tv".to_string()
}

fn default_port() -> u16 {
    6667
}

fn default_trigger() -> String {
    "!".to_string()
}

fn default_banlist_path() -> String {
    "banlist.txt".to_string()
}

fn default_capacity() -> u32 {
    20
}

fn default_window_secs() -> u64 {
    30
}

fn default_mime_cooldown() -> u64 {
    30
}

/// Normalize a user-supplied channel name: lowercase, `#`-prefixed.
pub fn channel_key(name: &str) -> String {
    let name = name.trim().to_lowercase();
    if name.starts_with('#') {
        name
    } else {
        format!("#{}", name)
    }
}

impl BotConfig {
    /// Parse a TOML document. Channel keys are normalized.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: BotConfig = toml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// First-run configuration: a section for the bot's own channel and one
    /// for the owner's, both joined at startup.
    pub fn bootstrap(nick: &str, owner: &str, password: &str, trigger: &str) -> Self {
        let nick = nick.trim().to_lowercase();
        let owner = owner.trim().to_lowercase();

        let mut channels = BTreeMap::new();
        for name in [&nick, &owner] {
            channels.insert(
                channel_key(name),
                ChannelConfig {
                    connect_on_startup: true,
                    trigger: Some(trigger.to_string()),
                    ..ChannelConfig::default()
                },
            );
        }

        Self {
            bot: BotSettings {
                bot_nick: nick.clone(),
                bot_user: nick.clone(),
                bot_name: nick,
                bot_owner: owner,
                bot_password: password.to_string(),
                trigger: trigger.to_string(),
                ..BotSettings::default()
            },
            rate_limit: RateLimitConfig::default(),
            channels,
            password_override: None,
        }
    }

    /// Lowercase the nick, owner and channel keys. Later sections win when
    /// two keys collide after folding.
    pub fn normalize(&mut self) {
        self.bot.bot_nick = self.bot.bot_nick.trim().to_lowercase();
        self.bot.bot_owner = self.bot.bot_owner.trim().to_lowercase();
        let channels = std::mem::take(&mut self.channels);
        self.channels = channels
            .into_iter()
            .map(|(name, section)| (channel_key(&name), section))
            .collect();
    }

    /// Check everything that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.bot_nick.is_empty() {
            return Err(ConfigError::Missing("bot.bot_nick"));
        }
        if self.bot.bot_owner.is_empty() {
            return Err(ConfigError::Missing("bot.bot_owner"));
        }
        if self.bot.trigger.is_empty() {
            return Err(ConfigError::Missing("bot.trigger"));
        }
        if self.password().is_empty() {
            return Err(ConfigError::Missing("bot.bot_password"));
        }

        self.rate_limit.bucket()?;

        for (name, section) in &self.channels {
            if section.trigger.as_deref() == Some("") {
                return Err(ConfigError::Missing("channels.trigger"));
            }
            ChannelRules::compile(name, section)?;
        }

        Ok(())
    }

    /// Take the password from [`PASSWORD_ENV`] when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if !password.is_empty() {
                self.password_override = Some(password);
            }
        }
    }

    /// The password to authenticate with.
    pub fn password(&self) -> &str {
        self.password_override
            .as_deref()
            .unwrap_or(&self.bot.bot_password)
    }

    pub fn user(&self) -> &str {
        non_empty_or(&self.bot.bot_user, &self.bot.bot_nick)
    }

    pub fn real_name(&self) -> &str {
        non_empty_or(&self.bot.bot_name, &self.bot.bot_nick)
    }

    /// The bot's own channel, `#<bot_nick>`.
    pub fn own_channel(&self) -> String {
        channel_key(&self.bot.bot_nick)
    }

    /// Effective trigger for `channel`.
    pub fn trigger_for(&self, channel: &str) -> &str {
        self.channels
            .get(channel)
            .and_then(|section| section.trigger.as_deref())
            .unwrap_or(&self.bot.trigger)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

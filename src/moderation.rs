//! Per-channel moderation rules.
//!
//! Patterns from a channel's configuration section are compiled once, when
//! the channel is joined or the configuration is validated, and shared with
//! the PRIVMSG pipeline through an `Arc`.

use std::sync::LazyLock;

use regex::Regex;

use crate::auth::{Role, Sender};
use crate::config::{ChannelConfig, ConfigError};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\s|\A|\b)(?:(?:https?://)?(?P<url>(?:[^\s/$.?#][^\s/]*)\.[^\s]*[.]?[^\s]*))(?:\s|\A|\b)",
    )
    .expect("URL pattern is valid")
});

/// Returns `true` when `text` contains something that looks like a URL.
pub fn contains_url(text: &str) -> bool {
    URL_PATTERN.is_match(text)
}

/// Pattern matching an `@nick` mention anywhere in a message.
pub fn mention_pattern(nick: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)(?:\s|\A|\b)(@{})(?:\s|$|\b)",
        regex::escape(nick)
    ))
}

/// Why a message is to be deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteReason {
    Url,
    BannedPhrase,
}

impl DeleteReason {
    /// Extra chat line sent after the deletion, if any.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            DeleteReason::Url => Some("no urls allowed"),
            DeleteReason::BannedPhrase => None,
        }
    }
}

/// Compiled moderation settings of one channel.
#[derive(Clone, Debug)]
pub struct ChannelRules {
    banned: Option<Regex>,
    block_urls: bool,
    mime: Option<Regex>,
    mime_cooldown_secs: u64,
}

impl ChannelRules {
    /// Compile the patterns of `config`. `channel` only names the culprit in
    /// errors.
    pub fn compile(channel: &str, config: &ChannelConfig) -> Result<Self, ConfigError> {
        let pattern_error = |key: &'static str| {
            move |source| ConfigError::InvalidPattern {
                channel: channel.to_string(),
                key,
                source,
            }
        };

        let banned = config
            .banned_phrases
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| Regex::new(&format!("(?i){}", p)))
            .transpose()
            .map_err(pattern_error("banned_phrases"))?;

        let mime = config
            .mime_emotes
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| Regex::new(&format!(r"(?:\s|\A|\b)(?P<emote>{})(?:\s|$|\b)", p)))
            .transpose()
            .map_err(pattern_error("mime_emotes"))?;

        Ok(Self {
            banned,
            block_urls: config.block_urls,
            mime,
            mime_cooldown_secs: config.mime_emotes_cooldown,
        })
    }

    /// Rules that never act.
    pub fn none() -> Self {
        Self {
            banned: None,
            block_urls: false,
            mime: None,
            mime_cooldown_secs: 0,
        }
    }

    /// URL blocking exempts VIPs and above.
    pub fn blocks_url(&self, text: &str, sender: &Sender) -> bool {
        self.block_urls && sender.role() < Role::Vip && contains_url(text)
    }

    /// Banned phrases exempt moderators and above.
    pub fn is_banned(&self, text: &str, sender: &Sender) -> bool {
        match &self.banned {
            Some(pattern) => sender.role() < Role::Moderator && pattern.is_match(text),
            None => false,
        }
    }

    /// First deletion rule `text` violates, URL blocking checked first.
    pub fn deletion(&self, text: &str, sender: &Sender) -> Option<DeleteReason> {
        if self.blocks_url(text, sender) {
            Some(DeleteReason::Url)
        } else if self.is_banned(text, sender) {
            Some(DeleteReason::BannedPhrase)
        } else {
            None
        }
    }

    /// The emote to repeat back, if `text` contains one.
    pub fn mime_emote<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.mime
            .as_ref()?
            .captures(text)?
            .name("emote")
            .map(|m| m.as_str())
    }

    pub fn mime_cooldown_ms(&self) -> i64 {
        i64::try_from(self.mime_cooldown_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

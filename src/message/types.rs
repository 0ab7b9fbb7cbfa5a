use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{MessageParseError, TagLookupMiss};
use crate::prefix::Prefix;

use super::nom_parser::ParsedMessage;
use super::tags::TagMap;

/// One parsed protocol line.
///
/// # Example
///
/// ```
/// use volpesbot::Message;
///
/// let msg: Message = "@badges=moderator/1 :nick!user@host PRIVMSG #chan :hello world"
///     .parse()
///     .unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.channel, "#chan");
/// assert_eq!(msg.trailing.as_deref(), Some("hello world"));
/// assert_eq!(msg.tag("badges"), Ok("moderator/1"));
/// ```
#[derive(Clone, Debug)]
pub struct Message {
    /// The line exactly as received.
    pub raw: String,
    /// Undecoded tag segment, without the leading `@`. Empty if absent.
    pub tags: String,
    /// Origin of the line.
    pub prefix: Prefix,
    /// Command name or three-digit numeric reply code. Never empty.
    pub command: String,
    /// First middle parameter, usually the channel target. Empty if absent.
    pub channel: String,
    /// Final colon-prefixed parameter. `Some("")` for a bare `:`.
    pub trailing: Option<String>,
    decoded: OnceLock<TagMap>,
}

impl Message {
    /// Parse a wire line. A trailing CR/LF is ignored.
    pub fn parse(line: &str) -> Result<Self, MessageParseError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let parsed = ParsedMessage::parse(trimmed)?;

        Ok(Self {
            raw: line.to_owned(),
            tags: parsed.tags.unwrap_or_default().to_owned(),
            prefix: parsed.prefix.map(Prefix::parse).unwrap_or_default(),
            command: parsed.command.to_owned(),
            channel: parsed
                .middles
                .first()
                .map(|s| (*s).to_owned())
                .unwrap_or_default(),
            trailing: parsed.trailing.map(str::to_owned),
            decoded: OnceLock::new(),
        })
    }

    /// Decoded tags, built on first access and cached afterwards.
    pub fn tag_map(&self) -> &TagMap {
        self.decoded.get_or_init(|| TagMap::decode(&self.tags))
    }

    /// Look up one tag value.
    pub fn tag(&self, key: &str) -> Result<&str, TagLookupMiss> {
        self.tag_map().get(key)
    }

    /// The trailing parameter, or `""` when there is none.
    pub fn text(&self) -> &str {
        self.trailing.as_deref().unwrap_or_default()
    }

    /// Nickname of the sender, if the prefix carries one.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.nick()
    }

    /// Returns `true` for three-digit numeric replies.
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
            && self.tags == other.tags
            && self.prefix == other.prefix
            && self.command == other.command
            && self.channel == other.channel
            && self.trailing == other.trailing
    }
}

impl Eq for Message {}

impl FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw.trim_end_matches(['\r', '\n']))
    }
}

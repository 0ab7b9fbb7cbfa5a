//! Sender identity and authorization.
//!
//! A sender's [`Role`] is derived per message from the `badges` tag and a
//! static identity check against the configured owner. Sub-commands declare
//! the minimum role they need and the dispatcher checks it through
//! [`Sender::authorize`] before running anything.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::message::Message;

/// Privilege levels, lowest first. A higher role satisfies any lower
/// requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Anyone,
    Vip,
    Moderator,
    Broadcaster,
    /// The configured bot owner, in any channel.
    Owner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Anyone => "anyone",
            Role::Vip => "vip",
            Role::Moderator => "moderator",
            Role::Broadcaster => "broadcaster",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge names from a `badges` tag such as `broadcaster/1,subscriber/12`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BadgeSet {
    names: HashSet<String>,
}

impl BadgeSet {
    /// Parse a `badges` tag value. The `/version` suffix is dropped.
    pub fn parse(value: &str) -> Self {
        let names = value
            .split(',')
            .filter(|badge| !badge.is_empty())
            .map(|badge| badge.split('/').next().unwrap_or(badge).to_string())
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Outcome of an authorization check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied { required: Role, actual: Role },
}

impl Authorization {
    pub fn is_granted(self) -> bool {
        matches!(self, Authorization::Granted)
    }
}

/// Who sent a chat message, and with what privileges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    nick: String,
    display_name: Option<String>,
    badges: BadgeSet,
    owner: bool,
}

impl Sender {
    pub fn new(nick: impl Into<String>, badges: BadgeSet, owner: bool) -> Self {
        Self {
            nick: nick.into(),
            display_name: None,
            badges,
            owner,
        }
    }

    /// Derive the sender of `msg`. `owner` is the configured bot owner's
    /// nick.
    pub fn from_message(msg: &Message, owner: &str) -> Self {
        let nick = msg.source_nickname().unwrap_or_default().to_string();

        let badges = match msg.tag("badges") {
            Ok(value) => BadgeSet::parse(value),
            Err(miss) => {
                debug!(nick = %nick, error = %miss, "no badges on message, treating as none");
                BadgeSet::default()
            }
        };

        let display_name = msg
            .tag("display-name")
            .ok()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let owner = !nick.is_empty() && nick.eq_ignore_ascii_case(owner);

        Self {
            nick,
            display_name,
            badges,
            owner,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// The `display-name` tag, or the prefix nick when the tag is missing.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.nick)
    }

    pub fn badges(&self) -> &BadgeSet {
        &self.badges
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn is_broadcaster(&self) -> bool {
        self.badges.contains("broadcaster")
    }

    pub fn is_moderator(&self) -> bool {
        self.badges.contains("moderator")
    }

    pub fn is_vip(&self) -> bool {
        self.badges.contains("vip")
    }

    /// Highest role the sender holds.
    pub fn role(&self) -> Role {
        if self.owner {
            Role::Owner
        } else if self.is_broadcaster() {
            Role::Broadcaster
        } else if self.is_moderator() {
            Role::Moderator
        } else if self.is_vip() {
            Role::Vip
        } else {
            Role::Anyone
        }
    }

    pub fn authorize(&self, required: Role) -> Authorization {
        let actual = self.role();
        if actual >= required {
            Authorization::Granted
        } else {
            Authorization::Denied { required, actual }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(line: &str) -> Sender {
        Sender::from_message(&Message::parse(line).unwrap(), "grayfox96")
    }

    #[test]
    fn test_badge_parsing() {
        let badges = BadgeSet::parse("broadcaster/1,subscriber/12,glhf-pledge/1");
        assert!(badges.contains("broadcaster"));
        assert!(badges.contains("subscriber"));
        assert!(!badges.contains("moderator"));
        assert!(BadgeSet::parse("").is_empty());
    }

    #[test]
    fn test_roles_from_badges() {
        assert_eq!(
            sender("@badges=moderator/1 :a!a@a PRIVMSG #c :x").role(),
            Role::Moderator
        );
        assert_eq!(
            sender("@badges=vip/1,moderator/1 :a!a@a PRIVMSG #c :x").role(),
            Role::Moderator
        );
        assert_eq!(
            sender("@badges=broadcaster/1 :a!a@a PRIVMSG #c :x").role(),
            Role::Broadcaster
        );
        assert_eq!(
            sender("@badges=vip/1 :a!a@a PRIVMSG #c :x").role(),
            Role::Vip
        );
        assert_eq!(
            sender("@badges= :a!a@a PRIVMSG #c :x").role(),
            Role::Anyone
        );
    }

    #[test]
    fn test_owner_by_nick() {
        let s = sender("@badges= :grayfox96!grayfox96@host PRIVMSG #c :x");
        assert!(s.is_owner());
        assert_eq!(s.role(), Role::Owner);
        assert!(s.authorize(Role::Broadcaster).is_granted());
    }

    #[test]
    fn test_missing_badges_tag_is_no_badges() {
        let s = sender(":a!a@a PRIVMSG #c :x");
        assert!(s.badges().is_empty());
        assert_eq!(s.role(), Role::Anyone);
    }

    #[test]
    fn test_substring_badge_is_not_a_match() {
        // `moderator` inside another badge name must not grant anything.
        let s = sender("@badges=notmoderator/1 :a!a@a PRIVMSG #c :x");
        assert!(!s.is_moderator());
    }

    #[test]
    fn test_authorize_denial_reports_roles() {
        let s = sender("@badges=vip/1 :a!a@a PRIVMSG #c :x");
        assert_eq!(
            s.authorize(Role::Moderator),
            Authorization::Denied {
                required: Role::Moderator,
                actual: Role::Vip,
            }
        );
        assert!(s.authorize(Role::Vip).is_granted());
        assert!(s.authorize(Role::Anyone).is_granted());
    }

    #[test]
    fn test_display_name_fallback() {
        let s = sender("@display-name=GrayFox96 :grayfox96!g@g PRIVMSG #c :x");
        assert_eq!(s.display_name(), "GrayFox96");
        let s = sender(":someone!s@s PRIVMSG #c :x");
        assert_eq!(s.display_name(), "someone");
    }
}

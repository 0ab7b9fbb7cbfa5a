//! Message prefix (origin) type.
//!
//! A prefix identifies where a line came from: a bare server hostname
//! (`tmi.twitch.tv`) or a user mask (`nick!user@host`). Every component is
//! optional; a bare hostname lands in `nick` with no user or host.

use std::fmt;

/// The origin of a message, split into its `nick!user@host` parts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// Nickname, or the server hostname for server-originated lines.
    pub nick: Option<String>,
    /// Username (ident), the part after `!`.
    pub user: Option<String>,
    /// Hostname, the part after `@`.
    pub host: Option<String>,
}

impl Prefix {
    /// Split a raw prefix (without the leading `:`).
    ///
    /// This is a lenient parser: it never fails and does not validate the
    /// characters of each component.
    pub fn parse(s: &str) -> Self {
        #[derive(Copy, Clone, Eq, PartialEq)]
        enum Part {
            Nick,
            User,
            Host,
        }

        let mut nick = String::new();
        let mut user = String::new();
        let mut host = String::new();
        let mut part = Part::Nick;

        for c in s.chars() {
            match c {
                '!' if part == Part::Nick => part = Part::User,
                '@' if part != Part::Host => part = Part::Host,
                _ => match part {
                    Part::Nick => &mut nick,
                    Part::User => &mut user,
                    Part::Host => &mut host,
                }
                .push(c),
            }
        }

        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            nick: non_empty(nick),
            user: non_empty(user),
            host: non_empty(host),
        }
    }

    /// Returns `true` when the prefix carries no component at all.
    pub fn is_empty(&self) -> bool {
        self.nick.is_none() && self.user.is_none() && self.host.is_none()
    }

    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(nick) = &self.nick {
            f.write_str(nick)?;
        }
        if let Some(user) = &self.user {
            write!(f, "!{}", user)?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}

//! Informational commands: `ping`, `redbar`, `connectedchannels`, `gettags`.

use std::time::Duration;

use async_trait::async_trait;

use super::{DetachedCommand, InlineCommand, Invocation};
use crate::handlers::HandlerResult;
use crate::session::Session;

const REDBAR_EXPLANATION: &str = "When the player's Pokémon is at 5/24 or less of their max HP \
there will be a beeping sound and you are able to input during Pokémon cries, saving ~1 second \
every time a Pokémon enters the battle.";

/// Render a duration as `H:MM:SS`, with a `N day(s), ` prefix past a day.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// `ping`: report uptime.
pub struct Ping;

#[async_trait]
impl DetachedCommand for Ping {
    async fn run(&self, invocation: Invocation) -> HandlerResult {
        let text = format!("Uptime: {}", format_uptime(invocation.uptime));
        invocation.reply(&text).await
    }
}

/// `redbar [max_hp]`: the low-HP threshold of a Pokémon speedrun trick.
pub struct Redbar;

impl Redbar {
    fn answer(param: Option<&str>) -> Option<String> {
        let Some(arg) = param else {
            return Some(REDBAR_EXPLANATION.to_string());
        };
        let max_hp: u64 = arg.parse().ok()?;
        let threshold = max_hp.checked_mul(5)? / 24;
        Some(format!("{}/{}", threshold, max_hp))
    }
}

#[async_trait]
impl DetachedCommand for Redbar {
    async fn run(&self, invocation: Invocation) -> HandlerResult {
        match Redbar::answer(invocation.first_arg()) {
            Some(text) => invocation.reply(&text).await,
            None => invocation.reply("Usage: redbar [integer]").await,
        }
    }
}

/// `connectedchannels`: list joined channels.
pub struct ConnectedChannels;

#[async_trait]
impl InlineCommand for ConnectedChannels {
    async fn run(&self, session: &mut Session, invocation: &Invocation) -> HandlerResult {
        let channels: Vec<&str> = session.joined().collect();
        let text = format!("I'm connected to these channels: {}.", channels.join(", "));
        invocation.reply(&text).await
    }
}

/// `gettags`: echo the raw line, tags included.
pub struct GetTags;

#[async_trait]
impl DetachedCommand for GetTags {
    async fn run(&self, invocation: Invocation) -> HandlerResult {
        invocation.reply(&invocation.raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_format() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_uptime(Duration::from_secs(3_725)), "1:02:05");
        assert_eq!(format_uptime(Duration::from_secs(86_400 + 61)), "1 day, 0:01:01");
        assert_eq!(
            format_uptime(Duration::from_secs(3 * 86_400 + 23 * 3_600)),
            "3 days, 23:00:00"
        );
    }

    #[test]
    fn test_redbar_threshold() {
        assert_eq!(Redbar::answer(Some("120")).as_deref(), Some("25/120"));
        assert_eq!(Redbar::answer(Some("23")).as_deref(), Some("4/23"));
        assert_eq!(Redbar::answer(None).as_deref(), Some(REDBAR_EXPLANATION));
        assert_eq!(Redbar::answer(Some("lots")), None);
        assert_eq!(Redbar::answer(Some("-4")), None);
        assert_eq!(Redbar::answer(Some("18446744073709551615")), None);
        assert_eq!(
            Redbar::answer(Some("3689348814741910323")).as_deref(),
            Some("768614336404564650/3689348814741910323")
        );
    }
}

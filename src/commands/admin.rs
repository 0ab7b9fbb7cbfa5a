//! Administrative commands: `banlist`, `temptimer`, `quit`, `restart`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{DetachedCommand, InlineCommand, Invocation};
use crate::handlers::HandlerResult;
use crate::session::Session;

/// `banlist <start> <limit>`: ban the users on lines `start..start+limit`
/// (1-based) of the ban list file, then report the line it stopped at.
pub struct Banlist {
    path: PathBuf,
}

impl Banlist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn range(param: Option<&str>) -> Option<(usize, usize)> {
        let mut args = param?.split_whitespace();
        let start = args.next()?.parse().ok()?;
        let limit = args.next()?.parse().ok()?;
        Some((start, limit))
    }
}

#[async_trait]
impl DetachedCommand for Banlist {
    async fn run(&self, invocation: Invocation) -> HandlerResult {
        let Some((start, limit)) = Banlist::range(invocation.param.as_deref()) else {
            return invocation.reply("Usage: banlist <start> <limit>").await;
        };

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "cannot read ban list");
                let text = format!("Can't find or access file {}", self.path.display());
                return invocation.reply(&text).await;
            }
        };

        let end = start.saturating_add(limit);
        let mut line_number = 0;
        for (index, user) in content.lines().enumerate() {
            line_number = index + 1;
            if line_number < start {
                continue;
            }
            if line_number >= end {
                break;
            }
            let user = user.trim();
            if !user.is_empty() {
                invocation.reply(&format!("/ban {}", user)).await?;
            }
        }

        invocation.reply(&line_number.to_string()).await
    }
}

/// `temptimer`: say "timer ended" after a delay, unless the bot shuts down
/// first.
pub struct TempTimer {
    delay: Duration,
}

impl TempTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for TempTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl DetachedCommand for TempTimer {
    async fn run(&self, invocation: Invocation) -> HandlerResult {
        let shutdown = invocation.lifecycle.shutdown_token();
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => invocation.reply("timer ended").await,
            _ = shutdown.cancelled() => {
                debug!("timer cancelled by shutdown");
                Ok(())
            }
        }
    }
}

/// `quit`: close the bot.
pub struct Quit;

#[async_trait]
impl InlineCommand for Quit {
    async fn run(&self, _session: &mut Session, invocation: &Invocation) -> HandlerResult {
        invocation.reply("Closing the bot").await?;
        invocation.lifecycle.request_quit();
        Ok(())
    }
}

/// `restart`: restart the bot with the same arguments.
pub struct Restart;

#[async_trait]
impl InlineCommand for Restart {
    async fn run(&self, _session: &mut Session, invocation: &Invocation) -> HandlerResult {
        invocation.reply("Restarting the bot").await?;
        invocation.lifecycle.request_restart();
        Ok(())
    }
}

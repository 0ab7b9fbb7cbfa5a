//! Chat sub-commands.
//!
//! A sub-command is chat text starting with the channel's trigger, such as
//! `!joinchannel somechannel`. The word after the trigger names the command
//! and the rest of the line is its single free-text argument.
//!
//! Every command declares the minimum [`Role`] it needs. The table checks it
//! before anything runs and answers insufficiently privileged senders with a
//! rejection. Commands that touch channel membership or the process
//! lifecycle run inline on the read loop; everything else runs as a detached
//! task so a slow command never holds up PING/PONG.

mod admin;
mod channels;
mod info;

pub use admin::{Banlist, Quit, Restart, TempTimer};
pub use channels::{JoinChannel, PartChannel};
pub use info::{format_uptime, ConnectedChannels, GetTags, Ping, Redbar};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::auth::{Authorization, Role, Sender};
use crate::handlers::HandlerResult;
use crate::lifecycle::Lifecycle;
use crate::outbound::Outbound;
use crate::session::Session;

/// Reply to a sender who lacks the role a command needs.
pub const REJECTION: &str = "You can't use that command.";

/// One parsed sub-command invocation.
#[derive(Clone)]
pub struct Invocation {
    /// Command name, lowercased.
    pub name: String,
    /// Everything after the name, trimmed. `None` when empty.
    pub param: Option<String>,
    /// Channel the command was typed in.
    pub channel: String,
    pub sender: Sender,
    /// The full wire line.
    pub raw: String,
    /// Session uptime when the command arrived.
    pub uptime: Duration,
    pub outbound: Outbound,
    pub lifecycle: Lifecycle,
}

impl Invocation {
    /// Answer in the channel the command came from.
    pub async fn reply(&self, text: &str) -> HandlerResult {
        self.outbound.privmsg(&self.channel, text).await?;
        Ok(())
    }

    /// First whitespace-separated word of the argument.
    pub fn first_arg(&self) -> Option<&str> {
        self.param.as_deref()?.split_whitespace().next()
    }
}

/// A command that runs on its own task and never touches the session.
#[async_trait]
pub trait DetachedCommand: Send + Sync {
    async fn run(&self, invocation: Invocation) -> HandlerResult;
}

/// A command that runs on the read loop with the session borrowed mutably.
#[async_trait]
pub trait InlineCommand: Send + Sync {
    async fn run(&self, session: &mut Session, invocation: &Invocation) -> HandlerResult;
}

/// How a command is executed.
#[derive(Clone)]
pub enum Execution {
    Detached(Arc<dyn DetachedCommand>),
    Inline(Arc<dyn InlineCommand>),
}

/// A registered command.
#[derive(Clone)]
pub struct CommandSpec {
    pub role: Role,
    pub execution: Execution,
}

impl CommandSpec {
    pub fn detached(role: Role, command: impl DetachedCommand + 'static) -> Self {
        Self {
            role,
            execution: Execution::Detached(Arc::new(command)),
        }
    }

    pub fn inline(role: Role, command: impl InlineCommand + 'static) -> Self {
        Self {
            role,
            execution: Execution::Inline(Arc::new(command)),
        }
    }
}

/// Split chat text into a sub-command name and its argument.
///
/// The name must follow the trigger directly. Returns `None` when `text`
/// is not a sub-command.
pub fn parse_invocation(trigger: &str, text: &str) -> Option<(String, Option<String>)> {
    if trigger.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(trigger)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let (name, param) = match rest.split_once(char::is_whitespace) {
        Some((name, param)) => (name, param.trim()),
        None => (rest.trim_end(), ""),
    };
    if name.is_empty() {
        return None;
    }

    let param = (!param.is_empty()).then(|| param.to_string());
    Some((name.to_lowercase(), param))
}

/// Name to command mapping, with authorization and execution policy.
pub struct CommandTable {
    commands: HashMap<&'static str, CommandSpec>,
    denied: AtomicU64,
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            denied: AtomicU64::new(0),
        }
    }

    /// Every built-in command. `banlist_path` is read by `banlist`.
    pub fn with_defaults(banlist_path: &str) -> Self {
        let mut table = Self::new();

        // Anyone
        table.insert("ping", CommandSpec::detached(Role::Anyone, Ping));
        table.insert("redbar", CommandSpec::detached(Role::Anyone, Redbar));
        table.insert(
            "connectedchannels",
            CommandSpec::inline(Role::Anyone, ConnectedChannels),
        );

        // Moderators
        table.insert("gettags", CommandSpec::detached(Role::Moderator, GetTags));
        table.insert(
            "joinchannel",
            CommandSpec::inline(Role::Moderator, JoinChannel),
        );
        let part = CommandSpec::inline(Role::Moderator, PartChannel);
        table.insert("partchannel", part.clone());
        table.insert("leavechannel", part);
        table.insert(
            "banlist",
            CommandSpec::detached(Role::Moderator, Banlist::new(banlist_path)),
        );
        table.insert("temptimer", CommandSpec::detached(Role::Moderator, TempTimer::default()));

        // Lifecycle
        table.insert("quit", CommandSpec::inline(Role::Moderator, Quit));
        table.insert("restart", CommandSpec::inline(Role::Moderator, Restart));

        table
    }

    pub fn insert(&mut self, name: &'static str, spec: CommandSpec) {
        self.commands.insert(name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Number of invocations refused for lack of privileges.
    pub fn denied_count(&self) -> u64 {
        self.denied.load(Ordering::Relaxed)
    }

    /// Authorize and run one invocation.
    ///
    /// Unknown names are ignored. Detached commands are spawned on `tasks`
    /// and their failures are logged there.
    pub async fn invoke(
        &self,
        session: &mut Session,
        tasks: &TaskTracker,
        invocation: Invocation,
    ) -> HandlerResult {
        let Some(spec) = self.commands.get(invocation.name.as_str()) else {
            debug!(command = %invocation.name, channel = %invocation.channel, "unknown sub-command");
            return Ok(());
        };

        if let Authorization::Denied { required, actual } = invocation.sender.authorize(spec.role)
        {
            self.denied.fetch_add(1, Ordering::Relaxed);
            info!(
                command = %invocation.name,
                channel = %invocation.channel,
                nick = invocation.sender.nick(),
                %required,
                %actual,
                "sub-command denied"
            );
            return invocation.reply(REJECTION).await;
        }

        let span = info_span!(
            "sub_command",
            command = %invocation.name,
            channel = %invocation.channel,
            nick = invocation.sender.nick()
        );

        match &spec.execution {
            Execution::Inline(command) => command.run(session, &invocation).instrument(span).await,
            Execution::Detached(command) => {
                let command = Arc::clone(command);
                tasks.spawn(
                    async move {
                        if let Err(error) = command.run(invocation).await {
                            warn!(%error, "sub-command failed");
                        }
                    }
                    .instrument(span),
                );
                Ok(())
            }
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

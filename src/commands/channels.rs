//! Membership commands: `joinchannel`, `partchannel`/`leavechannel`.

use async_trait::async_trait;

use super::{InlineCommand, Invocation};
use crate::config::channel_key;
use crate::handlers::HandlerResult;
use crate::session::{JoinOutcome, PartOutcome, Session};

/// `joinchannel <name>`
pub struct JoinChannel;

#[async_trait]
impl InlineCommand for JoinChannel {
    async fn run(&self, session: &mut Session, invocation: &Invocation) -> HandlerResult {
        let Some(name) = invocation.first_arg() else {
            return invocation.reply("Usage: joinchannel <channel>").await;
        };
        let channel = channel_key(name);

        match session.join(&channel)? {
            JoinOutcome::Joined { command } => {
                invocation.outbound.send_raw(&command).await?;
                invocation
                    .reply(&format!("Joined channel {}", channel))
                    .await
            }
            JoinOutcome::AlreadyJoined => {
                invocation
                    .reply(&format!("Already joined channel {}", channel))
                    .await
            }
        }
    }
}

/// `partchannel <name>`. Refuses the bot's own channel and the channel the
/// command was typed in.
pub struct PartChannel;

#[async_trait]
impl InlineCommand for PartChannel {
    async fn run(&self, session: &mut Session, invocation: &Invocation) -> HandlerResult {
        let Some(name) = invocation.first_arg() else {
            return invocation.reply("Usage: partchannel <channel>").await;
        };
        let channel = channel_key(name);

        if channel == session.own_channel() {
            return invocation
                .reply(
                    "I can't leave my own channel, if you don't want me to join this chat \
                     on startup edit the settings file",
                )
                .await;
        }
        if channel == invocation.channel {
            return invocation
                .reply("If you want me to leave this chat use the command in my chat")
                .await;
        }

        match session.part(&channel) {
            PartOutcome::Parted { command } => {
                invocation.outbound.send_raw(&command).await?;
                invocation.reply(&format!("Left channel {}", channel)).await
            }
            PartOutcome::NotJoined => {
                invocation
                    .reply(&format!("I'm not connected to channel {}", channel))
                    .await
            }
        }
    }
}

//! PRIVMSG handler: moderation and sub-command pipeline.
//!
//! Checks run in a fixed order and a deletion ends the pipeline:
//!
//! 1. URL blocking
//! 2. banned phrases
//! 3. emote mimicry (cooldown-gated)
//! 4. mention greeting
//! 5. sub-command

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Context, Handler, HandlerResult};
use crate::auth::Sender;
use crate::commands::{parse_invocation, Invocation};
use crate::event::{Category, DisplayEvent};
use crate::message::Message;
use crate::moderation::DeleteReason;

/// Cooldown key of the emote mimicry reaction.
const MIME_REACTION: &str = "mime_emotes";

/// Handler for PRIVMSG.
pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let channel = msg.channel.as_str();
        let text = msg.text();
        let sender = Sender::from_message(msg, &ctx.session.config().bot.bot_owner);

        ctx.outbound.events().emit(
            DisplayEvent::new(Category::Chat, text)
                .with_channel(channel)
                .with_sender(sender.display_name()),
        );

        let Some(state) = ctx.session.channel(channel) else {
            debug!(channel, "message from a channel that is not tracked");
            return Ok(());
        };
        let rules = state.rules().clone();
        let trigger = state.trigger().to_string();

        if let Some(reason) = rules.deletion(text, &sender) {
            if delete(ctx, msg, &sender, reason).await? {
                return Ok(());
            }
        }

        if let Some(emote) = rules.mime_emote(text) {
            match sent_timestamp(msg) {
                Some(now_ms) => {
                    let cooldown = rules.mime_cooldown_ms();
                    let react = ctx
                        .session
                        .channel_mut(channel)
                        .is_some_and(|state| state.try_react(MIME_REACTION, now_ms, cooldown));
                    if react {
                        ctx.outbound.privmsg(channel, emote).await?;
                    }
                }
                None => warn!(channel, "no usable tmi-sent-ts tag, skipping emote reaction"),
            }
        }

        if ctx.session.mentions_bot(text) {
            let greeting = format!("hi {}! I'm a bot.", sender.display_name());
            ctx.outbound.privmsg(channel, &greeting).await?;
        }

        if let Some((name, param)) = parse_invocation(&trigger, text) {
            let invocation = Invocation {
                name,
                param,
                channel: channel.to_string(),
                sender,
                raw: msg.to_string(),
                uptime: ctx.session.uptime(),
                outbound: ctx.outbound.clone(),
                lifecycle: ctx.lifecycle.clone(),
            };
            ctx.commands
                .invoke(ctx.session, ctx.tasks, invocation)
                .await?;
        }

        Ok(())
    }
}

/// Issue `/delete` for `msg`. Returns `false` when the message carries no
/// `id` tag, in which case the check is abandoned.
async fn delete(
    ctx: &mut Context<'_>,
    msg: &Message,
    sender: &Sender,
    reason: DeleteReason,
) -> Result<bool, super::HandlerError> {
    let id = match msg.tag("id") {
        Ok(id) => id,
        Err(miss) => {
            warn!(channel = %msg.channel, ?reason, error = %miss, "cannot delete message");
            return Ok(false);
        }
    };

    ctx.outbound
        .privmsg(&msg.channel, &format!("/delete {}", id))
        .await?;
    if let Some(notice) = reason.notice() {
        ctx.outbound.privmsg(&msg.channel, notice).await?;
    }

    info!(channel = %msg.channel, nick = sender.nick(), ?reason, "message deleted");
    ctx.outbound.events().emit(
        DisplayEvent::info(format!(
            "Message deleted from user {}, message content: {}",
            sender.nick(),
            msg.text()
        ))
        .with_channel(msg.channel.as_str()),
    );
    Ok(true)
}

fn sent_timestamp(msg: &Message) -> Option<i64> {
    msg.tag("tmi-sent-ts").ok()?.parse().ok()
}

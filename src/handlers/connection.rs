//! Connection upkeep and non-chat handlers.
//!
//! Handles PING, 376 (end of MOTD), NOTICE, PART, WHISPER and RECONNECT.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Context, Handler, HandlerResult};
use crate::event::{Category, DisplayEvent};
use crate::message::Message;

/// Handler for PING: answer with the same token.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.outbound
            .send_raw(&format!("PONG :{}", msg.text()))
            .await?;
        Ok(())
    }
}

/// Handler for 376 (RPL_ENDOFMOTD): registration is done, join the startup
/// channels.
pub struct EndOfMotdHandler;

#[async_trait]
impl Handler for EndOfMotdHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        if let Some(command) = ctx.session.join_startup()? {
            ctx.outbound.send_raw(&command).await?;
        }
        Ok(())
    }
}

/// Handler for NOTICE: show it and forward it to the bot's own channel.
pub struct NoticeHandler;

#[async_trait]
impl Handler for NoticeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let notice_id = msg.tag("msg-id").unwrap_or_default();
        info!(channel = %msg.channel, msg_id = notice_id, text = msg.text(), "server notice");

        ctx.outbound.events().emit(
            DisplayEvent::new(Category::Notice, msg.text()).with_channel(msg.channel.as_str()),
        );

        let own = ctx.session.own_channel();
        ctx.outbound
            .privmsg(&own, &format!("{} {}", msg.channel, msg.text()))
            .await?;
        Ok(())
    }
}

/// Handler for PART: report the bot's own departures.
///
/// Membership itself is only changed through [`Session::part`]; the server
/// echo is informational.
///
/// [`Session::part`]: crate::session::Session::part
pub struct PartHandler;

#[async_trait]
impl Handler for PartHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let is_self = msg
            .source_nickname()
            .is_some_and(|nick| nick.eq_ignore_ascii_case(ctx.session.nick()));
        if !is_self {
            return Ok(());
        }

        let own = ctx.session.own_channel();
        ctx.outbound
            .privmsg(&own, &format!("Parted channel: {}", msg.channel))
            .await?;
        Ok(())
    }
}

/// Handler for WHISPER (Twitch private messages): display only.
pub struct WhisperHandler;

#[async_trait]
impl Handler for WhisperHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let sender = msg
            .tag("display-name")
            .ok()
            .filter(|name| !name.is_empty())
            .or(msg.source_nickname())
            .unwrap_or_default();

        ctx.outbound
            .events()
            .emit(DisplayEvent::new(Category::Whisper, msg.text()).with_sender(sender));
        Ok(())
    }
}

/// Handler for RECONNECT: the server is about to drop the connection for
/// maintenance, so restart.
pub struct ReconnectHandler;

#[async_trait]
impl Handler for ReconnectHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        warn!("server requested reconnect");
        ctx.outbound
            .events()
            .emit(DisplayEvent::warning("Server requested a reconnect, restarting"));
        ctx.lifecycle.request_restart();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use super::*;
    use crate::lifecycle::Exit;

    async fn run(handler: impl Handler, fixture: &mut Fixture, line: &str) {
        let msg = Message::parse(line).unwrap();
        let mut ctx = fixture.ctx();
        handler.handle(&mut ctx, &msg).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_pong() {
        let mut fixture = Fixture::new();
        run(PingHandler, &mut fixture, "PING :tmi.twitch.tv").await;
        assert_eq!(fixture.sent(), vec!["PONG :tmi.twitch.tv"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_motd_joins_once() {
        let mut fixture = Fixture::new();
        run(EndOfMotdHandler, &mut fixture, ":tmi.twitch.tv 376 volpesbot :>").await;
        assert_eq!(fixture.sent(), vec!["JOIN #grayfox96,#volpesbot"]);

        run(EndOfMotdHandler, &mut fixture, ":tmi.twitch.tv 376 volpesbot :>").await;
        assert!(fixture.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_forwarded_to_own_channel() {
        let mut fixture = Fixture::new();
        run(
            NoticeHandler,
            &mut fixture,
            "@msg-id=slow_on :tmi.twitch.tv NOTICE #grayfox96 :This room is now in slow mode.",
        )
        .await;
        assert_eq!(
            fixture.sent(),
            vec!["PRIVMSG #volpesbot :#grayfox96 This room is now in slow mode."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_part_reports_only_own_departure() {
        let mut fixture = Fixture::new();
        run(PartHandler, &mut fixture, ":someone!someone@someone PART #grayfox96").await;
        assert!(fixture.sent().is_empty());

        run(PartHandler, &mut fixture, ":volpesbot!volpesbot@volpesbot PART #grayfox96").await;
        assert_eq!(
            fixture.sent(),
            vec!["PRIVMSG #volpesbot :Parted channel: #grayfox96"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_whisper_sends_nothing() {
        let mut fixture = Fixture::new();
        run(
            WhisperHandler,
            &mut fixture,
            "@display-name=Friend :friend!friend@friend WHISPER volpesbot :psst",
        )
        .await;
        assert!(fixture.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_requests_restart() {
        let mut fixture = Fixture::new();
        run(ReconnectHandler, &mut fixture, ":tmi.twitch.tv RECONNECT").await;
        assert_eq!(fixture.lifecycle.requested(), Some(Exit::Restart));
    }
}

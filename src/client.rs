//! The bot: registration, the read loop and shutdown.
//!
//! One task reads lines off the transport and dispatches them strictly in
//! order; line N+1 is not parsed before line N's handler has returned.
//! Outbound lines are queued through [`Outbound`] and written by a separate
//! writer task, so a handler waiting on the rate limiter never blocks the
//! socket writes that are already queued.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::commands::CommandTable;
use crate::config::{BotConfig, ConfigError, ConfigStore};
use crate::error::{MessageParseError, OutboundError};
use crate::event::{Category, DisplayEvent, EventSink};
use crate::handlers::{Context, HandlerRegistry};
use crate::lifecycle::{Exit, Lifecycle};
use crate::message::Message;
use crate::outbound::Outbound;
use crate::session::Session;
use crate::transport::Transport;

/// How long shutdown waits for detached commands and for the writer to
/// flush.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Errors that stop the bot before or instead of running.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("outbound receiver was already taken")]
    OutboundTaken,
}

/// A connected bot instance.
pub struct Bot {
    session: Session,
    registry: HandlerRegistry,
    commands: CommandTable,
    outbound: Outbound,
    rx: Option<mpsc::UnboundedReceiver<String>>,
    lifecycle: Lifecycle,
    tasks: TaskTracker,
    store: Arc<dyn ConfigStore>,
}

impl Bot {
    /// Validate `config` and build every component of one connection.
    pub fn new(
        config: BotConfig,
        store: Arc<dyn ConfigStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, BotError> {
        config.validate()?;

        let bucket = Arc::new(config.rate_limit.bucket().map_err(ConfigError::from)?);
        let (outbound, rx) = Outbound::new(bucket, events);
        let registry =
            HandlerRegistry::with_defaults().log_unhandled(config.bot.log_unhandled.iter().cloned());
        let commands = CommandTable::with_defaults(&config.bot.banlist_path);
        let session = Session::new(config)?;

        Ok(Self {
            session,
            registry,
            commands,
            outbound,
            rx: Some(rx),
            lifecycle: Lifecycle::new(),
            tasks: TaskTracker::new(),
            store,
        })
    }

    /// Replace the sub-command table.
    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Take the outbound queue to drain it by hand instead of through
    /// [`Bot::run`].
    pub fn take_outbound(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.rx.take()
    }

    /// Send the registration sequence. The password is masked on display.
    pub async fn register(&self) -> Result<(), OutboundError> {
        let config = self.session.config();
        self.outbound
            .send_raw("CAP REQ :twitch.tv/tags twitch.tv/commands")
            .await?;
        self.outbound.send_masked("PASS", config.password()).await?;
        self.outbound
            .send_raw(&format!("NICK {}", config.bot.bot_nick))
            .await?;
        self.outbound
            .send_raw(&format!(
                "USER {} 0 * :{}",
                config.user(),
                config.real_name()
            ))
            .await?;
        Ok(())
    }

    /// Parse and dispatch one inbound line. Returns the pending exit
    /// request, if the line (or anything before it) produced one.
    ///
    /// Nothing here fails the loop: malformed lines and handler errors are
    /// logged and dropped.
    pub async fn handle_line(&mut self, line: &str) -> Option<Exit> {
        let events = Arc::clone(self.outbound.events());

        let msg = match Message::parse(line) {
            Ok(msg) => msg,
            Err(MessageParseError::EmptyMessage) => return self.lifecycle.requested(),
            Err(error) => {
                let raw = line.trim_end_matches(['\r', '\n']);
                warn!(%error, raw, "dropping malformed line");
                events.emit(DisplayEvent::warning(format!("Malformed line: {}", raw)));
                return self.lifecycle.requested();
            }
        };

        if self.session.config().bot.verbose_log {
            events.emit(DisplayEvent::new(Category::Raw, msg.to_string()));
        }

        let mut ctx = Context {
            session: &mut self.session,
            outbound: &self.outbound,
            lifecycle: &self.lifecycle,
            commands: &self.commands,
            tasks: &self.tasks,
        };
        if let Err(error) = self.registry.dispatch(&mut ctx, &msg).await {
            warn!(command = %msg.command, channel = %msg.channel, %error, "handler failed");
        }

        self.lifecycle.requested()
    }

    /// Save the current configuration. Failures are logged.
    pub fn save_settings(&self) {
        match self.store.save(self.session.config()) {
            Ok(()) => debug!("settings saved"),
            Err(error) => warn!(%error, "failed to save settings"),
        }
    }

    /// Run until quit or restart is requested or the connection drops.
    ///
    /// A dropped connection or transport error ends with
    /// [`Exit::Restart`]. On the way out the settings are saved, pending
    /// timers are cancelled, and detached commands and the writer get
    /// [`SHUTDOWN_GRACE`] each to finish.
    pub async fn run<S>(mut self, transport: Transport<S>) -> Result<Exit, BotError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut rx = self.rx.take().ok_or(BotError::OutboundTaken)?;
        let (mut sink, mut stream) = transport.into_framed().split();

        let mut writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                sink.send(line).await?;
            }
            sink.close().await
        });
        let mut writer_done = false;

        let exit = loop {
            tokio::select! {
                line = stream.next() => match line {
                    Some(Ok(line)) => {
                        if let Some(exit) = self.handle_line(&line).await {
                            break exit;
                        }
                    }
                    // The codec skips unreadable lines itself; anything
                    // surfacing here ends the framed stream.
                    Some(Err(error)) => {
                        warn!(%error, "connection error");
                        break Exit::Restart;
                    }
                    None => {
                        warn!("connection closed by server");
                        break Exit::Restart;
                    }
                },
                exit = self.lifecycle.wait_exit() => break exit,
                result = &mut writer, if !writer_done => {
                    writer_done = true;
                    match result {
                        Ok(Ok(())) => warn!("writer stopped"),
                        Ok(Err(error)) => warn!(%error, "write failed"),
                        Err(error) => warn!(%error, "writer task failed"),
                    }
                    break Exit::Restart;
                }
            }
        };

        info!(?exit, "shutting down");
        self.lifecycle.request(exit);
        self.save_settings();
        self.lifecycle.begin_shutdown();

        self.tasks.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.tasks.wait())
            .await
            .is_err()
        {
            warn!("detached commands still running after grace period");
        }

        info!(
            handled = ?self.registry.stats(),
            denied = self.commands.denied_count(),
            "session summary"
        );

        // The writer ends once every outbound handle is gone.
        drop(self);
        if !writer_done && tokio::time::timeout(SHUTDOWN_GRACE, writer).await.is_err() {
            warn!("outbound queue not flushed within grace period");
        }

        Ok(exit)
    }
}

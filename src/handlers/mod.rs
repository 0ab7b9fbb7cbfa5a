//! Protocol command handlers.
//!
//! This module contains the [`Handler`] trait and the [`HandlerRegistry`]
//! that routes each parsed [`Message`] to the handler registered for its
//! command. Commands without a handler are ignored.

mod connection;
mod privmsg;
mod registry;

pub use connection::{
    EndOfMotdHandler, NoticeHandler, PartHandler, PingHandler, ReconnectHandler, WhisperHandler,
};
pub use privmsg::PrivmsgHandler;
pub use registry::HandlerRegistry;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::task::TaskTracker;

use crate::commands::CommandTable;
use crate::config::ConfigError;
use crate::error::OutboundError;
use crate::lifecycle::Lifecycle;
use crate::message::Message;
use crate::outbound::Outbound;
use crate::session::Session;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Channel membership and configuration. Only the read loop holds it.
    pub session: &'a mut Session,
    /// Rate-limited send path.
    pub outbound: &'a Outbound,
    /// Quit/restart requests.
    pub lifecycle: &'a Lifecycle,
    /// Chat sub-commands.
    pub commands: &'a CommandTable,
    /// Tracks detached sub-command tasks so shutdown can wait for them.
    pub tasks: &'a TaskTracker,
}

/// Errors that can occur during command handling.
///
/// The read loop logs these and moves on to the next line.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("send failed: {0}")]
    Outbound(#[from] OutboundError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle an incoming message.
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}

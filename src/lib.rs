//! # volpesbot
//!
//! A Twitch chat bot built on the tag-augmented IRC dialect Twitch speaks.
//!
//! ## Features
//!
//! - Line parsing with tag blocks, prefixes, middle and trailing parameters
//! - Lazy tag decoding with explicit lookup misses
//! - A shared token-bucket limiter in front of every outbound send
//! - Command dispatch through a handler registry
//! - Chat sub-commands with role-based authorization
//! - Per-channel moderation: URL blocking, banned phrases, emote mimicry
//! - TOML configuration saved back on quit and restart

#![deny(clippy::all)]

//! ## Quick Start
//!
//! ### Parsing lines
//!
//! ```rust
//! use volpesbot::Message;
//!
//! let raw = "@badges=broadcaster/1;display-name=GrayFox96 :grayfox96!grayfox96@grayfox96.tmi.twitch.tv PRIVMSG #grayfox96 :!ping";
//! let message: Message = raw.parse().expect("valid line");
//!
//! assert_eq!(message.command, "PRIVMSG");
//! assert_eq!(message.tag("display-name"), Ok("GrayFox96"));
//! assert!(message.tag("color").is_err());
//! ```
//!
//! ### Running a bot
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use volpesbot::config::{ConfigStore, TomlFileStore};
//! use volpesbot::event::TracingSink;
//! use volpesbot::{Bot, Transport};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = Arc::new(TomlFileStore::new("volpesbot.toml"));
//! let config = store.load()?;
//! let transport = Transport::connect(&config.bot.server, config.bot.port).await?;
//!
//! let bot = Bot::new(config, store, Arc::new(TracingSink))?;
//! bot.register().await?;
//! let exit = bot.run(transport).await?;
//! # let _ = exit;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod lifecycle;
pub mod line;
pub mod message;
pub mod moderation;
pub mod outbound;
pub mod prefix;
pub mod ratelimit;
pub mod session;
pub mod transport;

pub use self::client::{Bot, BotError};
pub use self::error::{
    LimiterError, MessageParseError, OutboundError, ProtocolError, TagLookupMiss,
};
pub use self::lifecycle::{Exit, Lifecycle};
pub use self::line::LineCodec;
pub use self::message::{Message, TagMap};
pub use self::outbound::Outbound;
pub use self::prefix::Prefix;
pub use self::ratelimit::TokenBucket;
pub use self::transport::Transport;

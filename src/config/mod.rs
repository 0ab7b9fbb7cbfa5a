//! Configuration loading and persistence.
//!
//! This module is split into:
//! - [`types`]: the TOML document (`BotConfig`, `BotSettings`, `ChannelConfig`,
//!   `RateLimitConfig`) and its validation
//! - [`store`]: the save/load collaborator (`ConfigStore`, `TomlFileStore`)

mod store;
mod types;

pub use store::{ConfigStore, TomlFileStore};
pub use types::{
    channel_key, BotConfig, BotSettings, ChannelConfig, ConfigError, RateLimitConfig,
    PASSWORD_ENV,
};

//! volpesbot - a Twitch chat bot.
//!
//! Usage: `volpesbot [config-path]` (default `volpesbot.toml`).

use std::ffi::OsString;
use std::process::Command;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use volpesbot::config::{BotConfig, ConfigStore, TomlFileStore};
use volpesbot::event::TracingSink;
use volpesbot::{Bot, Exit, Transport};

const DEFAULT_CONFIG_PATH: &str = "volpesbot.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let store = Arc::new(TomlFileStore::new(&config_path));

    if !store.exists() {
        let template =
            BotConfig::bootstrap("your_bot_nick", "your_twitch_nick", "oauth:your_token", "!");
        store.save(&template)?;
        error!(
            path = %config_path,
            "no configuration found; wrote a template, fill in bot_nick, bot_owner and bot_password and start again"
        );
        std::process::exit(2);
    }

    let mut config = store
        .load()
        .with_context(|| format!("loading {}", config_path))?;
    config.apply_env_overrides();
    config
        .validate()
        .with_context(|| format!("validating {}", config_path))?;

    info!(
        server = %config.bot.server,
        port = config.bot.port,
        nick = %config.bot.bot_nick,
        "starting volpesbot"
    );

    let transport = Transport::connect(&config.bot.server, config.bot.port)
        .await
        .with_context(|| format!("connecting to {}:{}", config.bot.server, config.bot.port))?;

    let bot = Bot::new(config, store, Arc::new(TracingSink))?;
    bot.register().await?;

    let lifecycle = bot.lifecycle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            lifecycle.request_quit();
        }
    });

    match bot.run(transport).await? {
        Exit::Quit => {
            info!("bye");
            Ok(())
        }
        Exit::Restart => restart(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var_os("VOLPESBOT_LOG_JSON").is_some() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Replace the current process with a fresh copy, same arguments.
fn restart() -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("locating own executable")?;
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    info!(exe = %exe.display(), "restarting");

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        // exec only returns on failure.
        let err = Command::new(&exe).args(&args).exec();
        Err::<(), _>(err).context("re-executing")
    }

    #[cfg(not(unix))]
    {
        Command::new(&exe)
            .args(&args)
            .spawn()
            .context("spawning replacement process")?;
        Ok(())
    }
}

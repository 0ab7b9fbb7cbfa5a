//! Process lifecycle signals.
//!
//! Two externally triggerable requests, quit and restart, are checked by
//! the read loop after every dispatch cycle. A separate shutdown token is
//! cancelled once the loop has decided to stop, so pending timers in
//! detached tasks can bail out.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::info;

/// How the bot should end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Exit {
    /// Terminate the process.
    Quit,
    /// Re-execute the process with the same arguments.
    Restart,
}

#[derive(Debug, Default)]
struct Inner {
    exit: OnceLock<Exit>,
    requested: CancellationToken,
    shutdown: CancellationToken,
}

/// Shared handle onto the quit/restart requests.
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_quit(&self) {
        self.request(Exit::Quit);
    }

    pub fn request_restart(&self) {
        self.request(Exit::Restart);
    }

    /// Record `exit` unless another request got there first.
    pub fn request(&self, exit: Exit) {
        if self.inner.exit.set(exit).is_ok() {
            info!(?exit, "exit requested");
        }
        self.inner.requested.cancel();
    }

    /// The pending request, if any.
    pub fn requested(&self) -> Option<Exit> {
        self.inner.exit.get().copied()
    }

    /// Wait until quit or restart is requested.
    pub async fn wait_exit(&self) -> Exit {
        self.inner.requested.cancelled().await;
        self.requested().unwrap_or(Exit::Quit)
    }

    /// Cancelled when the bot starts tearing down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub fn begin_shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

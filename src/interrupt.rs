//! Routes Ctrl-C to whichever role is currently running.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Hands out one token per role and cancels the active one on interrupt.
///
/// A single listener lives for the whole run, so an interrupt that lands
/// while a role is still building its workspace cancels that role's follow
/// instead of going unheard.
#[derive(Debug, Clone)]
pub struct InterruptRelay {
    parent: CancellationToken,
    current: Arc<Mutex<CancellationToken>>,
}

impl Default for InterruptRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptRelay {
    pub fn new() -> Self {
        let parent = CancellationToken::new();
        let current = Arc::new(Mutex::new(parent.child_token()));
        Self { parent, current }
    }

    /// Token for the next role. Earlier tokens are left untouched.
    pub fn arm(&self) -> CancellationToken {
        let token = self.parent.child_token();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }

    /// Cancels the token handed out by the latest [`arm`](Self::arm).
    pub fn trigger(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Cancels every token, armed or not.
    pub fn shutdown(&self) {
        self.parent.cancel();
    }

    /// Spawns the Ctrl-C listener. It keeps listening until [`shutdown`](Self::shutdown).
    pub fn listen(&self) -> JoinHandle<()> {
        let relay = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = relay.parent.cancelled() => break,
                    result = signal::ctrl_c() => {
                        if result.is_err() {
                            break;
                        }
                        info!(target = "ine_setup", "interrupt received; stopping log follow");
                        relay.trigger();
                    }
                }
            }
        })
    }
}

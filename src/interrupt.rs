use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Notify, oneshot};
use tracing::{info, warn};

type StopSlot = Option<oneshot::Sender<()>>;

/// Process-wide Ctrl+C routing. While a foreground session holds a claim the
/// signal stops that session only; at any other time it asks the program to
/// exit.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    foreground: Arc<Mutex<StopSlot>>,
    exit: Arc<Notify>,
}

impl Interrupts {
    /// Installs the SIGINT listener. Call once, from inside the runtime.
    pub fn listen(&self) {
        let interrupts = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    warn!("failed to listen for Ctrl+C: {error}");
                    return;
                }
                interrupts.deliver();
            }
        });
    }

    pub fn deliver(&self) {
        let claimed = self.slot().take();
        let stopped = claimed.is_some_and(|stop| stop.send(()).is_ok());
        if stopped {
            info!("interrupt stopped foreground session");
        } else {
            info!("interrupt requested exit");
            self.exit.notify_one();
        }
    }

    pub fn claim_foreground(&self) -> ForegroundClaim {
        let (stop, stopped) = oneshot::channel();
        *self.slot() = Some(stop);
        ForegroundClaim {
            stopped,
            interrupts: self.clone(),
        }
    }

    /// Resolves once an interrupt arrives with no foreground claim held.
    pub async fn exit_requested(&self) {
        self.exit.notified().await;
    }

    fn slot(&self) -> MutexGuard<'_, StopSlot> {
        self.foreground
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Routes interrupts to one foreground session until dropped.
pub struct ForegroundClaim {
    stopped: oneshot::Receiver<()>,
    interrupts: Interrupts,
}

impl ForegroundClaim {
    pub async fn interrupted(&mut self) {
        if (&mut self.stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Whether an interrupt already landed, without waiting.
    pub fn was_interrupted(&mut self) -> bool {
        self.stopped.try_recv().is_ok()
    }
}

impl Drop for ForegroundClaim {
    fn drop(&mut self) {
        *self.interrupts.slot() = None;
    }
}

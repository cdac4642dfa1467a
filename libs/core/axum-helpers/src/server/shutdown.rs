use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Fans a single shutdown trigger out to every interested task.
///
/// The trigger is either an OS signal (see [`ShutdownCoordinator::listen_for_signals`])
/// or an explicit [`ShutdownCoordinator::shutdown`] call.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    tx: watch::Sender<bool>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx,
            initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.initiated.load(Ordering::Acquire)
    }

    /// Idempotent.
    pub fn shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("Initiating graceful shutdown");
            self.tx.send_replace(true);
        }
    }

    /// Resolves once shutdown has been initiated, including before the call.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Err means every sender is gone, which only happens after shutdown.
        let _ = rx.wait_for(|initiated| *initiated).await;
    }

    /// Waits for SIGINT or SIGTERM, then initiates shutdown.
    pub async fn listen_for_signals(&self) {
        shutdown_signal().await;
        self.shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Completes on SIGINT or SIGTERM. A handler that fails to install is logged
/// and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

use tokio_util::sync::CancellationToken;

/// Graceful shutdown coordinator.
///
/// Subsystems hold child tokens; triggering shutdown cancels all of them.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a subsystem that must stop when shutdown begins
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger shutdown (call this from signal handler)
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            log::info!("Shutdown signal received, notifying all subsystems");
        }
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for shutdown signal
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Graceful shutdown coordination.
//!
//! The coordinator turns SIGINT/SIGTERM into a broadcast that the HTTP
//! server and background tasks subscribe to. The runtime then gives
//! in-flight requests a bounded drain period.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Broadcasts a one-shot shutdown notification.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<()>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a future-like handle that resolves once shutdown starts.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
            shutdown_initiated: self.shutdown_initiated.clone(),
        }
    }

    /// Starts shutdown. Only the first call has an effect.
    pub fn initiate_shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Shutdown initiated");
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once shutdown has started.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Waits for an OS termination signal, then starts shutdown.
    ///
    /// Returns immediately if shutdown has already started.
    pub async fn wait_for_os_signal(&self) {
        if self.is_shutdown_initiated() {
            return;
        }

        let mut signal = self.shutdown_signal();
        tokio::select! {
            _ = os_signal() => {}
            _ = signal.recv() => return,
        }

        self.initiate_shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C elsewhere).
///
/// If a handler cannot be installed the future never resolves through
/// that signal; the failure is logged.
async fn os_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

// =============================================================================
// ShutdownSignal
// =============================================================================

/// Subscription to a [`ShutdownCoordinator`].
pub struct ShutdownSignal {
    receiver: broadcast::Receiver<()>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Waits until shutdown starts.
    pub async fn recv(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.receiver.recv().await;
    }

    /// Consumes the signal and waits until shutdown starts.
    pub async fn wait(mut self) {
        self.recv().await;
    }
}

// =============================================================================
// Drain
// =============================================================================

/// Awaits `task` for at most `timeout`.
///
/// Returns `None` if the deadline passed first.
pub async fn drain_with_timeout<F, T>(task: F, timeout: Duration) -> Option<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, task).await {
        Ok(output) => Some(output),
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "Drain timeout elapsed");
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_signal_resolves() {
        let coordinator = ShutdownCoordinator::new();
        let signal = coordinator.shutdown_signal();

        let trigger = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.initiate_shutdown();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("shutdown signal should resolve");
        assert!(coordinator.is_shutdown_initiated());
    }

    #[tokio::test]
    async fn test_signal_after_shutdown_resolves_immediately() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.initiate_shutdown();
        coordinator.initiate_shutdown();

        let signal = coordinator.shutdown_signal();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("already-initiated shutdown should not block");
    }

    #[tokio::test]
    async fn test_wait_for_os_signal_returns_on_manual_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        let trigger = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.initiate_shutdown();
        });

        tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_os_signal())
            .await
            .expect("manual shutdown should end the wait");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let coordinator = ShutdownCoordinator::new();
        let a = coordinator.shutdown_signal();
        let b = coordinator.shutdown_signal();

        coordinator.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), async {
            a.wait().await;
            b.wait().await;
        })
        .await
        .expect("every subscriber is notified");
    }

    #[tokio::test]
    async fn test_drain_with_timeout() {
        let done = drain_with_timeout(async { 7 }, Duration::from_secs(1)).await;
        assert_eq!(done, Some(7));

        let stuck = drain_with_timeout(std::future::pending::<()>(), Duration::from_millis(20)).await;
        assert!(stuck.is_none());
    }
}

//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Periodic token cleanup

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::service::TokenService;

/// Background sweep over the token store
#[derive(Debug)]
pub struct TokenCleanupTask {
    service: Arc<TokenService>,
    interval: Duration,
}

impl TokenCleanupTask {
    pub fn new(service: Arc<TokenService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Start the sweep loop
    ///
    /// The first sweep runs immediately. A failed sweep is logged and retried
    /// on the next tick.
    pub fn spawn(self) -> TokenCleanupHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let service = self.service;
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            info!("Token cleanup task started, interval {:?}", period);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        match service.cleanup_expired().await {
                            Ok(report) => debug!(
                                "Token cleanup pass removed {} records",
                                report.total_removed
                            ),
                            Err(e) => error!("Token cleanup failed: {}", e),
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Token cleanup task stopping");
                        break;
                    }
                }
            }
        });

        TokenCleanupHandle {
            shutdown_tx,
            handle,
        }
    }
}

/// Handle to a running cleanup task
#[derive(Debug)]
pub struct TokenCleanupHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl TokenCleanupHandle {
    /// Signal the task and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            error!("Token cleanup task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

//! Service reachability and the periodic health probe

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use claire_api::ServiceApi;
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::WidgetEvent;

/// Default time between health probes
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(60);

/// Shared reachability flag.
///
/// Cloning is cheap; all clones observe the same value. Only the
/// [`ConnectivityMonitor`] writes it.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityState {
    reachable: Arc<AtomicBool>,
}

impl ConnectivityState {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
        }
    }

    /// Result of the most recent probe
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    /// Store a probe result, returning the previous value
    pub(crate) fn set(&self, reachable: bool) -> bool {
        self.reachable.swap(reachable, Ordering::AcqRel)
    }
}

/// Probes the service's health endpoint and records the outcome
#[derive(Clone)]
pub struct ConnectivityMonitor {
    api: Arc<dyn ServiceApi>,
    state: ConnectivityState,
    period: Duration,
    events: broadcast::Sender<WidgetEvent>,
}

impl ConnectivityMonitor {
    pub fn new(
        api: Arc<dyn ServiceApi>,
        state: ConnectivityState,
        period: Duration,
        events: broadcast::Sender<WidgetEvent>,
    ) -> Self {
        let period = if period.is_zero() {
            tracing::warn!(
                "Health interval of zero is not allowed, using {:?}",
                DEFAULT_HEALTH_INTERVAL
            );
            DEFAULT_HEALTH_INTERVAL
        } else {
            period
        };
        Self {
            api,
            state,
            period,
            events,
        }
    }

    pub fn state(&self) -> &ConnectivityState {
        &self.state
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one probe. Any failure (status, transport, payload) counts as
    /// unreachable; only a "healthy" payload counts as reachable.
    pub async fn probe(&self) -> bool {
        let reachable = match self.api.health().await {
            Ok(health) => {
                if !health.is_healthy() {
                    tracing::debug!("Service reports status '{}'", health.status);
                }
                health.is_healthy()
            }
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        };

        let previous = self.state.set(reachable);
        if previous != reachable {
            tracing::info!(reachable, "Connectivity changed");
            let _ = self
                .events
                .send(WidgetEvent::ConnectivityChanged { reachable });
        }
        reachable
    }

    /// Probe immediately, then every `period`, until the returned handle is
    /// stopped or dropped. Must be called inside a tokio runtime.
    pub fn spawn(&self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let monitor = self.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.period);
            // A slow probe pushes the next one back instead of bunching up
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = async {
                        ticker.tick().await;
                        monitor.probe().await;
                    } => {}
                }
            }
            tracing::debug!("Connectivity monitor stopped");
        });

        MonitorHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owns the running probe task. Dropping it stops the task.
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Ask the task to stop
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Connectivity monitor task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

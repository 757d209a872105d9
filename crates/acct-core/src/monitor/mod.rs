//! Periodic refresh of the live account, with an explicit start/stop lifecycle.

pub(crate) mod monitor_state;
pub(crate) mod usage;

use crate::{MonitorState, StatusReport, SwapEngine, UsageReport, UsageSource};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Latest refresh result published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub refreshed_at: DateTime<Utc>,
    pub status: Option<StatusReport>,
    pub usage: Option<UsageReport>,
    pub error: Option<String>,
}

struct RunningTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the refresh task. Dropping the monitor ends the task.
pub struct Monitor {
    engine: SwapEngine,
    interval: Duration,
    usage: Option<Arc<dyn UsageSource>>,
    state_tx: watch::Sender<MonitorState>,
    snapshot_tx: watch::Sender<Option<MonitorSnapshot>>,
    task: Mutex<Option<RunningTask>>,
}

impl Monitor {
    pub fn new(engine: SwapEngine, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(MonitorState::Stopped);
        let (snapshot_tx, _) = watch::channel(None);

        Self {
            engine,
            interval,
            usage: None,
            state_tx,
            snapshot_tx,
            task: Mutex::new(None),
        }
    }

    pub fn with_usage_source(mut self, usage: Arc<dyn UsageSource>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn state(&self) -> MonitorState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MonitorState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<MonitorSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Spawns the refresh task. A no-op unless the monitor is stopped.
    pub async fn start(&self) -> MonitorState {
        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("Monitor already started ({:?})", self.state());
            return self.state();
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let engine = self.engine.clone();
        let usage = self.usage.clone();
        let interval = self.interval;
        let snapshot_tx = self.snapshot_tx.clone();

        let handle = tokio::spawn(async move {
            let mut last_live: Option<Option<u32>> = None;
            loop {
                let snapshot = refresh(&engine, usage.as_deref()).await;
                let live = snapshot.status.as_ref().map(|s| s.live_account);
                if let Some(live) = live
                    && last_live.is_some_and(|previous| previous != live)
                {
                    info!("Live account changed to {}", describe(live));
                }
                if live.is_some() {
                    last_live = live;
                }
                snapshot_tx.send_replace(Some(snapshot));

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("Monitor task finished");
        });

        *task = Some(RunningTask {
            shutdown_tx,
            handle,
        });
        self.state_tx.send_replace(MonitorState::Running);
        info!("Monitor started (every {}s)", self.interval.as_secs_f64());
        MonitorState::Running
    }

    /// Signals the task and waits for it. A no-op when already stopped.
    pub async fn stop(&self) -> MonitorState {
        let Some(running) = self.task.lock().await.take() else {
            return self.state();
        };

        self.state_tx.send_replace(MonitorState::Stopping);
        running.shutdown_tx.send_replace(true);
        if let Err(e) = running.handle.await {
            warn!("Monitor task ended abnormally: {e}");
        }

        self.state_tx.send_replace(MonitorState::Stopped);
        info!("Monitor stopped");
        MonitorState::Stopped
    }

    /// One refresh outside the task; also publishes the result.
    pub async fn refresh_now(&self) -> MonitorSnapshot {
        let snapshot = refresh(&self.engine, self.usage.as_deref()).await;
        self.snapshot_tx.send_replace(Some(snapshot.clone()));
        snapshot
    }
}

async fn refresh(engine: &SwapEngine, usage: Option<&dyn UsageSource>) -> MonitorSnapshot {
    let status_engine = engine.clone();
    let (status, error) = match tokio::task::spawn_blocking(move || status_engine.status()).await
    {
        Ok(Ok(status)) => (Some(status), None),
        Ok(Err(e)) => {
            warn!("Status refresh failed: {e}");
            (None, Some(e.to_string()))
        }
        Err(e) => {
            warn!("Status refresh task failed: {e}");
            (None, Some(e.to_string()))
        }
    };

    let usage = match (usage, engine.live_access_token()) {
        (Some(source), Some(token)) => source.fetch_usage(&token).await,
        _ => None,
    };

    MonitorSnapshot {
        refreshed_at: Utc::now(),
        status,
        usage,
        error,
    }
}

fn describe(account: Option<u32>) -> String {
    match account {
        Some(n) => format!("Account-{n}"),
        None => String::from("an unsaved account"),
    }
}

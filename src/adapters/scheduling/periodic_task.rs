//! PeriodicTask - Cancellable background loop.
//!
//! Runs a job once at startup and then on every interval tick until told
//! to stop. Each run is bounded by a deadline; a run that overruns is
//! abandoned and the next tick starts fresh.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 60s | Time between runs (at least 1ms) |
//! | `deadline` | 10s | Upper bound on a single run |
//!
//! ## Shutdown
//!
//! `stop()` may be called any number of times, from any task. Every call
//! returns only after the loop has exited.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Shortest period the loop will tick at; smaller intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct PeriodicTaskConfig {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PeriodicTaskConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            deadline: Duration::from_secs(10),
        }
    }
}

impl PeriodicTaskConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Handle to a running periodic job.
pub struct PeriodicTask {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    /// Spawns `job` on the current runtime.
    pub fn spawn<F, Fut, E>(name: &'static str, config: PeriodicTaskConfig, job: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let config = PeriodicTaskConfig {
            interval: config.interval.max(MIN_INTERVAL),
            ..config
        };
        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(run_loop(name, config, receiver, job));
        tracing::info!(task = name, "periodic task started");

        Self {
            name,
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signals the loop to stop and waits for it to exit.
    pub async fn stop(&self) {
        // Held across the join so concurrent callers also wait for exit.
        let mut handle = self.handle.lock().await;
        self.shutdown.send_replace(true);

        if let Some(handle) = handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(task = self.name, error = %e, "periodic task ended abnormally");
            }
            tracing::info!(task = self.name, "periodic task stopped");
        }
    }

    /// True until `stop()` has observed the loop exit.
    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

async fn run_loop<F, Fut, E>(
    name: &'static str,
    config: PeriodicTaskConfig,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    // First tick fires immediately.
    let mut interval = time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }

            _ = interval.tick() => {
                match time::timeout(config.deadline, job()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(task = name, error = %e, "periodic run failed");
                    }
                    Err(_) => {
                        tracing::warn!(
                            task = name,
                            deadline_ms = config.deadline.as_millis() as u64,
                            "periodic run exceeded deadline"
                        );
                    }
                }
            }
        }
    }
}

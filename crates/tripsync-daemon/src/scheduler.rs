//! Pass scheduler.
//!
//! Drives reconciliation passes on a fixed interval (with a little jitter),
//! or on demand through a command channel. At most one pass is ever in
//! flight: the pass future is awaited inline in the loop, so a tick that
//! would land mid-pass is simply absorbed, and a stop request received
//! while a pass runs takes effect at the pass boundary.
//!
//! There is deliberately no backoff or retry machinery here: a failed pass
//! computes no partial state, and the next scheduled tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::error::DaemonResult;
use crate::report::PassReport;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between passes.
    pub poll_interval: Duration,
    /// Maximum jitter added to the interval (as fraction 0.0-1.0).
    pub jitter_fraction: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            jitter_fraction: 0.05,
        }
    }
}

impl SchedulerConfig {
    /// Creates a config with the given poll interval.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Default::default()
        }
    }

    /// Builder: set jitter fraction.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Calculates the delay until the next tick, with jitter.
    pub fn next_tick_delay(&self) -> Duration {
        let base = self.poll_interval.as_secs_f64();
        let jitter = rand_jitter(base * self.jitter_fraction);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }
}

/// Simple pseudo-random jitter in [-range, range], seeded from the clock.
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let fraction = (nanos as f64) / 1_000_000_000.0;
    (fraction * 2.0 - 1.0) * range
}

/// Commands that can be sent to a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run a pass immediately.
    RunNow,
    /// Stop after the current pass (if any) finishes.
    Stop,
}

/// Observable scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of passes attempted.
    pub passes: u64,
    /// Consecutive full-pass failures (fetch aborts).
    pub consecutive_failures: u32,
    /// Completion time of the last successful pass.
    pub last_pass: Option<DateTime<Utc>>,
    /// Summary of the last successful pass.
    pub last_summary: Option<String>,
    /// Error message of the last failed pass.
    pub last_error: Option<String>,
}

impl SchedulerState {
    /// Records a completed pass.
    pub fn record_success(&mut self, summary: impl Into<String>) {
        self.passes += 1;
        self.consecutive_failures = 0;
        self.last_pass = Some(Utc::now());
        self.last_summary = Some(summary.into());
        self.last_error = None;
    }

    /// Records an aborted pass.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.passes += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(error.into());
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::default()))
}

/// The scheduler drives reconciliation passes until stopped.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: Option<mpsc::Receiver<SchedulerCommand>>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop with the given pass function.
    ///
    /// An initial pass runs immediately; afterwards passes run on each tick
    /// or `RunNow` command until `Stop` arrives or the command channel
    /// closes.
    pub async fn run<F, Fut>(mut self, pass_fn: F)
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = DaemonResult<PassReport>> + Send,
    {
        let mut command_rx = self.command_rx.take().expect("run called twice");

        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "scheduler started"
        );

        self.do_pass(&pass_fn).await;

        loop {
            let delay = self.config.next_tick_delay();
            debug!(delay_secs = delay.as_secs(), "next pass scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.do_pass(&pass_fn).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RunNow) => {
                            debug!("received RunNow command");
                            self.do_pass(&pass_fn).await;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn do_pass<F, Fut>(&self, pass_fn: &F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = DaemonResult<PassReport>>,
    {
        debug!("starting pass");
        match pass_fn().await {
            Ok(report) => {
                report.log();
                self.state.write().await.record_success(report.to_string());
            }
            Err(e) => {
                warn!(error = %e, "pass aborted");
                self.state.write().await.record_failure(e.to_string());
            }
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Requests an immediate pass.
    pub async fn run_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RunNow).await
    }

    /// Requests a stop at the next pass boundary.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns a snapshot of the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert!(config.jitter_fraction > 0.0);
    }

    #[test]
    fn next_tick_delay_stays_within_jitter() {
        let config = SchedulerConfig::new(Duration::from_secs(60)).with_jitter(0.1);
        let delay = config.next_tick_delay();
        assert!(delay.as_secs_f64() >= 54.0);
        assert!(delay.as_secs_f64() <= 66.0);
    }

    #[test]
    fn state_records_success_and_failure() {
        let mut state = SchedulerState::default();
        state.record_failure("upstream down");
        assert_eq!(state.passes, 1);
        assert_eq!(state.consecutive_failures, 1);
        assert!(state.last_error.is_some());

        state.record_success("1 created, 0 updated, 0 unchanged, 0 orphaned, 0 failed");
        assert_eq!(state.passes, 2);
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_pass.is_some());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn scheduler_runs_and_stops() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();

        let pass_count = Arc::new(AtomicU32::new(0));
        let pass_count_clone = pass_count.clone();

        let scheduler_task = tokio::spawn(async move {
            scheduler
                .run(move || {
                    let count = pass_count_clone.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(PassReport::default())
                    }
                })
                .await;
        });

        // Initial pass.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pass_count.load(Ordering::SeqCst) >= 1);

        // Manual pass.
        handle.run_now().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pass_count.load(Ordering::SeqCst) >= 2);

        let state = handle.state().await;
        assert!(state.passes >= 2);
        assert_eq!(state.consecutive_failures, 0);

        handle.stop().await.unwrap();
        scheduler_task.await.unwrap();
    }

    #[tokio::test]
    async fn scheduler_keeps_ticking_after_failures() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_millis(10)));
        let handle = scheduler.handle();
        let state = scheduler.state();

        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let scheduler_task = tokio::spawn(async move {
            scheduler
                .run(move || {
                    let count = attempts_clone.clone();
                    async move {
                        let n = count.fetch_add(1, Ordering::SeqCst);
                        if n < 2 {
                            Err(crate::error::DaemonError::config("boom"))
                        } else {
                            Ok(PassReport::default())
                        }
                    }
                })
                .await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(attempts.load(Ordering::SeqCst) >= 3);

        // Recovered: failure streak reset by the first successful pass.
        assert_eq!(state.read().await.consecutive_failures, 0);

        handle.stop().await.unwrap();
        scheduler_task.await.unwrap();
    }
}

//! Periodic job scheduling.
//!
//! Every job runs on its own tokio task with its own interval, so cadences
//! are independent of each other. A job's firings are sequential because
//! the task awaits each firing before the next tick. Each job holds a child
//! of one group [`CancellationToken`]; stopping the scheduler cancels the
//! group and waits until every job task has ended.

use crate::queue::EventSender;
use chrono::{DateTime, Utc};
use datagen_core::Event;
use datagen_generator::{GeneratorError, Producer};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Failure of one job firing.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("Producer panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Whether the firing failed only because related data was not ready.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Generator(e) if e.is_transient())
    }
}

/// One producer bound to its cadence.
pub struct Job {
    name: String,
    cadence: Duration,
    producer: Box<dyn Producer>,
}

impl Job {
    pub fn new(producer: Box<dyn Producer>, cadence: Duration) -> Self {
        Self {
            name: producer.name().to_string(),
            cadence,
            producer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Run the producer once for time `at`.
    ///
    /// A panicking producer is reported as [`JobError::Panicked`] and does
    /// not take the job down.
    pub fn fire(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, JobError> {
        let producer = &mut self.producer;
        match std::panic::catch_unwind(AssertUnwindSafe(|| producer.produce(at))) {
            Ok(result) => Ok(result?),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(JobError::Panicked(message))
            }
        }
    }
}

/// Counters for one job.
#[derive(Debug, Default)]
pub struct JobStats {
    fired: AtomicU64,
    emitted: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`JobStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStatsSnapshot {
    pub fired: u64,
    pub emitted: u64,
    pub skipped: u64,
}

impl JobStats {
    pub fn snapshot(&self) -> JobStatsSnapshot {
        JobStatsSnapshot {
            fired: self.fired.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Owner of the running jobs.
pub struct Scheduler {
    group: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    stats: Vec<(String, Arc<JobStats>)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            group: CancellationToken::new(),
            handles: Vec::new(),
            stats: Vec::new(),
        }
    }

    /// Spawn one task per job. Each job fires immediately and then every
    /// `cadence`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, jobs: Vec<Job>, sender: EventSender) {
        for job in jobs {
            let stats = Arc::new(JobStats::default());
            self.stats.push((job.name.clone(), Arc::clone(&stats)));

            info!(
                "Scheduling job '{}' every {}ms",
                job.name,
                job.cadence.as_millis()
            );
            let token = self.group.child_token();
            let handle = tokio::spawn(run_job(job, sender.clone(), token, stats));
            self.handles.push(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Counters of every job started so far.
    pub fn stats(&self) -> Vec<(String, JobStatsSnapshot)> {
        self.stats
            .iter()
            .map(|(name, stats)| (name.clone(), stats.snapshot()))
            .collect()
    }

    /// Cancel every job and wait for their tasks to end.
    ///
    /// In-flight firings are not awaited to completion. Safe to call when
    /// nothing was started.
    pub async fn stop(&mut self) {
        self.group.cancel();
        for handle in self.handles.drain(..) {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Job task ended abnormally: {e}");
                }
            }
        }

        for (name, stats) in &self.stats {
            let s = stats.snapshot();
            info!(
                "Job '{}' stopped: fired={} emitted={} skipped={}",
                name, s.fired, s.emitted, s.skipped
            );
        }

        self.group = CancellationToken::new();
        self.stats.clear();
    }
}

async fn run_job(
    mut job: Job,
    sender: EventSender,
    token: CancellationToken,
    stats: Arc<JobStats>,
) {
    let mut interval = tokio::time::interval(job.cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        stats.fired.fetch_add(1, Ordering::Relaxed);
        match job.fire(Utc::now()) {
            Ok(events) => {
                let count = events.len();
                let accepted = sender.append_batch(events);
                stats.emitted.fetch_add(accepted as u64, Ordering::Relaxed);
                debug!("Job '{}' emitted {accepted}/{count} events", job.name);
            }
            Err(e) if e.is_transient() => {
                stats.skipped.fetch_add(1, Ordering::Relaxed);
                debug!("Job '{}' skipped firing: {e}", job.name);
            }
            Err(e) => {
                stats.skipped.fetch_add(1, Ordering::Relaxed);
                warn!("Job '{}' firing failed: {e}", job.name);
            }
        }
    }

    debug!("Job '{}' cancelled", job.name);
}

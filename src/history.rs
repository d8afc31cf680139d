//! Startup history backfill.
//!
//! On the genuinely first start of a task identity, the generator replays a
//! look-back window with a simulated clock. The same jobs that later run
//! live are fired at a stretched cadence from `end - window` up to `end`,
//! merged across jobs in chronological order. The whole backlog is built in
//! memory and handed over in one batch, or not at all.

use crate::config::{ConfigError, DatagenConfig};
use crate::scheduler::Job;
use anyhow::Context;
use checkpoint::{StoredMarker, TaskIdentity, TaskStateStore};
use chrono::{DateTime, Duration, Utc};
use datagen_core::Event;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info};

/// Upper bound on simulated firings per job in one backfill.
pub const MAX_FIRINGS_PER_JOB: i64 = 1_000_000;

/// Whether this task identity has never started before.
///
/// Only reads `store`. The answer stays true until [`record_first_start`]
/// commits the marker, so a start that fails part way is still treated as
/// the first one next time.
pub async fn starting_for_first_time(
    store: &dyn TaskStateStore,
    identity: &TaskIdentity,
) -> anyhow::Result<bool> {
    let existing = store
        .read_marker(identity)
        .await
        .with_context(|| format!("Failed to read task state for {identity}"))?;

    match existing {
        Some(marker) => {
            info!(
                "Task {identity} has started before (first start at {})",
                marker.created_at.to_rfc3339()
            );
            Ok(false)
        }
        None => {
            info!("Task {identity} is starting for the first time");
            Ok(true)
        }
    }
}

/// Record that `identity` has completed its first start.
pub async fn record_first_start(
    store: &dyn TaskStateStore,
    identity: &TaskIdentity,
    note: &str,
) -> anyhow::Result<()> {
    store
        .store_marker(&StoredMarker::new(identity.clone(), note))
        .await
        .with_context(|| format!("Failed to record task state for {identity}"))?;
    debug!("Recorded first start of {identity}");
    Ok(())
}

/// Replays a look-back window through the live jobs.
pub struct HistoryGenerator {
    window: Duration,
    cadence_factor: u32,
    rng: StdRng,
}

impl HistoryGenerator {
    pub fn new(window: Duration, cadence_factor: u32, rng: StdRng) -> Self {
        Self {
            window,
            cadence_factor: cadence_factor.max(1),
            rng,
        }
    }

    pub fn from_config(config: &DatagenConfig, rng: StdRng) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.history.window_duration()?,
            config.history.cadence_factor,
            rng,
        ))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Simulated time between two historical firings of a job.
    ///
    /// At least one second, saturating at the largest representable
    /// duration.
    pub fn history_interval(&self, job: &Job) -> Duration {
        let millis = i64::try_from(job.cadence().as_millis())
            .unwrap_or(i64::MAX)
            .saturating_mul(i64::from(self.cadence_factor));
        Duration::try_milliseconds(millis.max(1_000)).unwrap_or(Duration::MAX)
    }

    /// Generate the backlog for the window ending at `end`.
    ///
    /// Events come back sorted by recorded time, all within
    /// `[end - window, end]`. A firing that fails only because related data
    /// is not ready is skipped; any other failure aborts the whole backfill.
    pub fn generate(
        &mut self,
        end: DateTime<Utc>,
        jobs: &mut [Job],
    ) -> anyhow::Result<Vec<Event>> {
        let start = end.checked_sub_signed(self.window).with_context(|| {
            format!(
                "history.window of {}s reaches before the earliest representable time",
                self.window.num_seconds()
            )
        })?;
        info!(
            "Generating history from {} to {} for {} jobs",
            start.to_rfc3339(),
            end.to_rfc3339(),
            jobs.len()
        );

        let mut intervals = Vec::with_capacity(jobs.len());
        let mut schedule = BinaryHeap::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            let interval = self.history_interval(job);
            let firings = self.window.num_milliseconds() / interval.num_milliseconds();
            if firings > MAX_FIRINGS_PER_JOB {
                anyhow::bail!(
                    "History for job '{}' would need {firings} firings (limit {MAX_FIRINGS_PER_JOB}); \
                     increase history.cadence_factor or shorten history.window",
                    job.name()
                );
            }

            // Stagger the first firing of each job within its own interval
            let offset = self.rng.gen_range(0..interval.num_milliseconds());
            if let Some(first) = Duration::try_milliseconds(offset)
                .and_then(|offset| start.checked_add_signed(offset))
            {
                schedule.push(Reverse((first, index)));
            }
            intervals.push(interval);
        }

        let mut events = Vec::new();
        let mut skipped = 0u64;
        while let Some(Reverse((at, index))) = schedule.pop() {
            if at > end {
                continue;
            }

            let job = &mut jobs[index];
            match job.fire(at) {
                Ok(produced) => events.extend(produced),
                Err(e) if e.is_transient() => {
                    skipped += 1;
                    debug!("History firing of '{}' at {at} skipped: {e}", job.name());
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context(format!(
                        "History generation failed in job '{}' at {}",
                        job.name(),
                        at.to_rfc3339()
                    )));
                }
            }

            if let Some(next) = at.checked_add_signed(intervals[index]) {
                schedule.push(Reverse((next, index)));
            }
        }

        events.sort_by_key(|e| e.recorded_at());
        if let Some(outside) = events
            .iter()
            .find(|e| e.recorded_at() < start || e.recorded_at() > end)
        {
            anyhow::bail!(
                "History event {} '{}' recorded at {} falls outside the window",
                outside.partition(),
                outside.key(),
                outside.recorded_at().to_rfc3339()
            );
        }

        info!(
            "Generated {} historical events ({skipped} firings skipped)",
            events.len()
        );
        Ok(events)
    }
}

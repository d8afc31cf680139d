//! The delivery facade.
//!
//! [`DatagenTask`] is the only surface the outside world uses: `start` and
//! `stop` for lifecycle, `poll` for the consumer. It wires configuration,
//! optional startup history, the scheduler and the queue together.

use crate::config::DatagenConfig;
use crate::history::{record_first_start, starting_for_first_time, HistoryGenerator};
use crate::queue::EventQueue;
use crate::scheduler::{Job, Scheduler};
use anyhow::Context;
use checkpoint::TaskStateStore;
use chrono::Utc;
use datagen_core::Event;
use datagen_generator::{
    seeded_rng, BadgeInProducer, CancellationProducer, GeneratorError, NewCustomerProducer,
    OnlineOrderProducer, OrderPattern, OrderPatternProducer, OrderProducer,
    ProductReviewProducer, Producer, RecentOrders, ReturnRequestProducer, SensorReadingProducer,
    StockMovementProducer, TransactionProducer,
};
use std::time::Duration;
use tracing::info;

/// Salt for the backfill RNG, distinct from every producer's salt.
const HISTORY_RNG_SALT: u64 = 100;

/// Salt for the RNG that generates the shared product catalog.
const CATALOG_RNG_SALT: u64 = 14;

/// Build one job per event kind from the configuration.
///
/// Orders, cancellations and new customers share one pool of recent orders.
/// Stock movements, online orders, returns and reviews share one product
/// catalog.
pub fn build_jobs(config: &DatagenConfig) -> Result<Vec<Job>, GeneratorError> {
    let seed = config.seed;
    let cadences = &config.cadences;
    let recent = RecentOrders::new(config.orders.recent_capacity);
    let catalog = config
        .review_settings()
        .build_catalog(&mut seeded_rng(seed, CATALOG_RNG_SALT))?;

    let job = |producer: Box<dyn Producer>, millis: u64| {
        Job::new(producer, Duration::from_millis(millis))
    };

    Ok(vec![
        job(
            Box::new(NewCustomerProducer::new(
                config.order_settings(),
                recent.clone(),
                seeded_rng(seed, 6),
            )?),
            cadences.new_customers,
        ),
        job(
            Box::new(OrderProducer::new(
                config.order_settings(),
                recent.clone(),
                seeded_rng(seed, 1),
            )?),
            cadences.orders,
        ),
        job(
            Box::new(CancellationProducer::new(recent, seeded_rng(seed, 2))),
            cadences.cancellations,
        ),
        job(
            Box::new(OrderPatternProducer::new(
                OrderPattern::FalsePositive,
                config.order_settings(),
                config.order_pattern_settings(),
                seeded_rng(seed, 7),
            )?),
            cadences.false_positive_orders,
        ),
        job(
            Box::new(OrderPatternProducer::new(
                OrderPattern::Suspicious,
                config.order_settings(),
                config.order_pattern_settings(),
                seeded_rng(seed, 8),
            )?),
            cadences.suspicious_orders,
        ),
        job(
            Box::new(StockMovementProducer::new(
                catalog.clone(),
                seeded_rng(seed, 9),
            )?),
            cadences.stock_movements,
        ),
        job(
            Box::new(BadgeInProducer::new(seeded_rng(seed, 10))),
            cadences.badge_ins,
        ),
        job(
            Box::new(SensorReadingProducer::new(seeded_rng(seed, 3))),
            cadences.sensor_readings,
        ),
        job(
            Box::new(SensorReadingProducer::high(seeded_rng(seed, 11))),
            cadences.high_sensor_readings,
        ),
        job(
            Box::new(OnlineOrderProducer::new(
                config.online_order_settings(),
                catalog.clone(),
                seeded_rng(seed, 12),
            )?),
            cadences.online_orders,
        ),
        job(
            Box::new(ReturnRequestProducer::new(
                config.review_settings(),
                catalog.clone(),
                seeded_rng(seed, 13),
            )?),
            cadences.return_requests,
        ),
        job(
            Box::new(ProductReviewProducer::new(
                config.review_settings(),
                catalog,
                seeded_rng(seed, 4),
            )?),
            cadences.product_reviews,
        ),
        job(
            Box::new(TransactionProducer::new(
                config.transaction_settings(),
                seeded_rng(seed, 5),
            )?),
            cadences.transactions,
        ),
    ])
}

/// A running (or stopped) generator task.
pub struct DatagenTask {
    queue: EventQueue,
    scheduler: Scheduler,
}

impl Default for DatagenTask {
    fn default() -> Self {
        Self::new()
    }
}

impl DatagenTask {
    pub fn new() -> Self {
        Self {
            queue: EventQueue::new(),
            scheduler: Scheduler::new(),
        }
    }

    /// Version of the generator.
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Start generating with the built-in jobs for `config`.
    ///
    /// `store` answers whether this task identity has run before. It is read
    /// on every start, and the first successful start records a marker in it
    /// whether or not startup history is enabled.
    pub async fn start(
        &mut self,
        config: &DatagenConfig,
        store: &dyn TaskStateStore,
    ) -> anyhow::Result<()> {
        config.validate().context("Invalid configuration")?;
        let jobs = build_jobs(config).context("Failed to create event producers")?;
        self.start_with_jobs(config, store, jobs).await
    }

    /// Start generating with caller-supplied jobs.
    pub async fn start_with_jobs(
        &mut self,
        config: &DatagenConfig,
        store: &dyn TaskStateStore,
        mut jobs: Vec<Job>,
    ) -> anyhow::Result<()> {
        let identity = config.task.identity();
        info!("Starting task {identity} (version {})", Self::version());

        config.validate().context("Invalid configuration")?;
        if self.scheduler.is_running() {
            anyhow::bail!("Task {identity} is already running");
        }
        if self.queue.is_closed() {
            self.queue = EventQueue::new();
        }

        let first_start = starting_for_first_time(store, &identity).await?;

        // replay a window of historical events only when this task identity
        // has never started before
        let backlog = if config.history.enabled && first_start {
            let rng = seeded_rng(config.seed, HISTORY_RNG_SALT);
            let mut history = HistoryGenerator::from_config(config, rng)
                .context("Invalid history configuration")?;
            let backlog = history
                .generate(Utc::now(), &mut jobs)
                .context("Failed to generate startup history")?;
            Some(backlog)
        } else {
            None
        };

        // the marker is committed only once nothing else can fail
        if first_start {
            let note = if backlog.is_some() {
                "first start with history"
            } else {
                "first start"
            };
            record_first_start(store, &identity, note).await?;
        }

        if let Some(backlog) = backlog {
            let queued = self.queue.sender().append_batch(backlog);
            info!("Historical events generated: {queued}");
        }
        self.scheduler.start(jobs, self.queue.sender());
        Ok(())
    }

    /// Take every event queued so far, in append order.
    pub fn poll(&mut self) -> Vec<Event> {
        self.queue.drain_all()
    }

    /// Stop all jobs and discard undelivered events.
    ///
    /// Safe to call before `start`, after a failed `start`, or repeatedly.
    /// Once this returns no job appends any more events.
    pub async fn stop(&mut self) {
        info!("Stopping task");
        self.scheduler.stop().await;
        self.queue.close();
        let discarded = self.queue.clear();
        if discarded > 0 {
            info!("Discarded {discarded} undelivered events");
        }
    }
}

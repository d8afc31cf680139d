//! Unusual-looking order patterns.
//!
//! Both patterns start with an unusually large order that is cancelled a
//! few minutes later:
//!
//! - a **false positive** stops there; the customer simply changed their mind
//! - a **suspicious** order is followed by a small order for the same product
//!   from the same customer, shortly after the cancellation
//!
//! The cancellation and the follow-up order are held until the producer's
//! clock reaches them, so every event of one pattern is emitted in time
//! order.

use crate::domain::customer::Customer;
use crate::domain::followup::FollowUps;
use crate::domain::order::{cancellation_event, cancellation_schema, order_schema, OrderSettings};
use crate::generators::numeric::generate_int_range;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Duration, Utc};
use datagen_core::{Event, EventSchema};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

/// Which pattern a producer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPattern {
    FalsePositive,
    Suspicious,
}

impl OrderPattern {
    pub fn job_name(&self) -> &'static str {
        match self {
            OrderPattern::FalsePositive => "false_positive_orders",
            OrderPattern::Suspicious => "suspicious_orders",
        }
    }

    fn cancel_reason(&self) -> &'static str {
        match self {
            OrderPattern::FalsePositive => "CHANGED_MIND",
            OrderPattern::Suspicious => "FOUND_CHEAPER",
        }
    }
}

/// Tunables shared by both patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPatternSettings {
    pub large_quantity_min: i64,
    pub large_quantity_max: i64,
    pub min_cancel_delay_secs: i64,
    pub max_cancel_delay_secs: i64,
    /// Upper bound on the gap between a suspicious cancellation and the
    /// small order that follows it
    pub max_reorder_delay_secs: i64,
}

impl Default for OrderPatternSettings {
    fn default() -> Self {
        Self {
            large_quantity_min: 20,
            large_quantity_max: 50,
            min_cancel_delay_secs: 60,
            max_cancel_delay_secs: 900,
            max_reorder_delay_secs: 300,
        }
    }
}

impl OrderPatternSettings {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.large_quantity_min < 1 || self.large_quantity_min > self.large_quantity_max {
            return Err(GeneratorError::Config(format!(
                "invalid large quantity range {}..={}",
                self.large_quantity_min, self.large_quantity_max
            )));
        }
        if self.min_cancel_delay_secs < 0 || self.min_cancel_delay_secs > self.max_cancel_delay_secs
        {
            return Err(GeneratorError::Config(format!(
                "invalid cancel delay range {}..={}",
                self.min_cancel_delay_secs, self.max_cancel_delay_secs
            )));
        }
        if self.max_reorder_delay_secs < 1 {
            return Err(GeneratorError::Config(
                "max_reorder_delay_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct OrderPatternProducer {
    pattern: OrderPattern,
    orders: OrderSettings,
    settings: OrderPatternSettings,
    order_schema: Arc<EventSchema>,
    cancellation_schema: Arc<EventSchema>,
    follow_ups: FollowUps,
    rng: StdRng,
}

impl OrderPatternProducer {
    pub fn new(
        pattern: OrderPattern,
        orders: OrderSettings,
        settings: OrderPatternSettings,
        rng: StdRng,
    ) -> Result<Self, GeneratorError> {
        orders.validate()?;
        settings.validate()?;
        Ok(Self {
            pattern,
            orders,
            settings,
            order_schema: Arc::new(order_schema()),
            cancellation_schema: Arc::new(cancellation_schema()),
            follow_ups: FollowUps::new(),
            rng,
        })
    }

    pub fn pattern(&self) -> OrderPattern {
        self.pattern
    }

    /// Cancellations and follow-up orders not yet emitted.
    pub fn pending(&self) -> usize {
        self.follow_ups.len()
    }
}

impl Producer for OrderPatternProducer {
    fn name(&self) -> &str {
        self.pattern.job_name()
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let customer = Customer::generate(&mut self.rng);
        let mut large = self.orders.order_line(&mut self.rng, &customer);
        large.quantity = generate_int_range(
            &mut self.rng,
            self.settings.large_quantity_min,
            self.settings.large_quantity_max,
        );

        let cancel_delay = self.rng.gen_range(
            self.settings.min_cancel_delay_secs..=self.settings.max_cancel_delay_secs,
        );
        let cancelled_at = at + Duration::seconds(cancel_delay);

        // Build the whole pattern first so a payload failure holds nothing
        let order = large.to_event(&self.order_schema, at)?;
        let cancellation = cancellation_event(
            &self.cancellation_schema,
            &mut self.rng,
            &large.id,
            self.pattern.cancel_reason(),
            cancelled_at,
        )?;
        let reorder = match self.pattern {
            OrderPattern::FalsePositive => None,
            OrderPattern::Suspicious => {
                let mut small = self.orders.order_line(&mut self.rng, &customer);
                small.description = large.description.clone();
                small.price = large.price;
                let reorder_delay = self.rng.gen_range(1..=self.settings.max_reorder_delay_secs);
                Some(small.to_event(
                    &self.order_schema,
                    cancelled_at + Duration::seconds(reorder_delay),
                )?)
            }
        };

        let mut events = self.follow_ups.release(at);
        events.push(order);
        self.follow_ups.schedule(cancellation);
        if let Some(reorder) = reorder {
            self.follow_ups.schedule(reorder);
        }
        Ok(events)
    }
}

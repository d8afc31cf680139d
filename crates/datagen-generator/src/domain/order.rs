//! Orders and cancellations.
//!
//! Cancellations are correlated with earlier orders: the order producer
//! records each order into a shared [`RecentOrders`] pool, and the
//! cancellation producer takes one order out of it. Neither side waits on
//! the pool: a busy or empty pool skips the cancellation firing, and an order
//! placed while the pool is busy is emitted but never offered for
//! cancellation.

use crate::domain::customer::Customer;
use crate::domain::product::Product;
use crate::generators::numeric::{generate_int_range, generate_money};
use crate::generators::pick::pick_str;
use crate::generators::timestamp::{format_event_time, not_before};
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, TryLockError};

pub const ORDER_PARTITION: &str = "order";
pub const CANCELLATION_PARTITION: &str = "cancellation";

pub(crate) const REGIONS: &[&str] = &["NA", "SA", "EMEA", "APAC"];
const CANCEL_REASONS: &[&str] = &["CHANGED_MIND", "BAD_FIT", "FOUND_CHEAPER", "DELAYED"];

pub fn order_schema() -> EventSchema {
    EventSchema::builder(ORDER_PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("customer", FieldType::String)
        .field("customerid", FieldType::String)
        .field("description", FieldType::String)
        .field("quantity", FieldType::Int64)
        .field("price", FieldType::Float64)
        .field("region", FieldType::String)
        .field("ordertime", FieldType::String)
        .build()
}

pub fn cancellation_schema() -> EventSchema {
    EventSchema::builder(CANCELLATION_PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("orderid", FieldType::String)
        .field("reason", FieldType::String)
        .field("canceltime", FieldType::String)
        .build()
}

/// What the cancellation producer needs to know about an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRef {
    pub id: String,
    pub ordered_at: DateTime<Utc>,
}

/// Bounded pool of recently placed orders, shared between the order and
/// cancellation producers.
///
/// Once full, recording a new order forgets the oldest one.
#[derive(Debug, Clone)]
pub struct RecentOrders {
    inner: Arc<Mutex<VecDeque<OrderRef>>>,
    capacity: usize,
}

impl RecentOrders {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an order without blocking.
    ///
    /// Returns false when the pool is busy; the order is then not offered
    /// for cancellation.
    pub fn record(&self, order: OrderRef) -> bool {
        let mut orders = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        if orders.len() == self.capacity {
            orders.pop_front();
        }
        orders.push_back(order);
        true
    }

    /// Take one order out of the pool without blocking.
    ///
    /// `pick` chooses the index given the current pool length.
    pub fn try_take(
        &self,
        pick: impl FnOnce(usize) -> usize,
    ) -> Result<OrderRef, GeneratorError> {
        let mut orders = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(GeneratorError::NoEligibleEntity(
                    "recent orders are busy".to_string(),
                ))
            }
        };
        if orders.is_empty() {
            return Err(GeneratorError::NoEligibleEntity(
                "no recent order to cancel".to_string(),
            ));
        }
        let index = pick(orders.len()).min(orders.len() - 1);
        orders
            .remove(index)
            .ok_or_else(|| GeneratorError::NoEligibleEntity("order vanished".to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One order line, before it becomes an event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub id: String,
    pub customer: Customer,
    pub description: String,
    pub quantity: i64,
    pub price: f64,
    pub region: String,
}

impl OrderLine {
    pub fn to_event(
        &self,
        schema: &Arc<EventSchema>,
        at: DateTime<Utc>,
    ) -> Result<Event, GeneratorError> {
        let event = Event::new(
            ORDER_PARTITION,
            self.id.clone(),
            Arc::clone(schema),
            vec![
                ("id".to_string(), FieldValue::from(self.id.clone())),
                ("customer".to_string(), FieldValue::from(self.customer.name.clone())),
                ("customerid".to_string(), FieldValue::from(self.customer.id.clone())),
                ("description".to_string(), FieldValue::from(self.description.clone())),
                ("quantity".to_string(), FieldValue::from(self.quantity)),
                ("price".to_string(), FieldValue::from(self.price)),
                ("region".to_string(), FieldValue::from(self.region.clone())),
                ("ordertime".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;
        Ok(event)
    }
}

/// Build a cancellation event for `order_id`, keyed by the order.
pub fn cancellation_event<R: Rng>(
    schema: &Arc<EventSchema>,
    rng: &mut R,
    order_id: &str,
    reason: &str,
    at: DateTime<Utc>,
) -> Result<Event, GeneratorError> {
    let event = Event::new(
        CANCELLATION_PARTITION,
        order_id.to_string(),
        Arc::clone(schema),
        vec![
            ("id".to_string(), FieldValue::from(generate_id(rng))),
            ("orderid".to_string(), FieldValue::from(order_id)),
            ("reason".to_string(), FieldValue::from(reason)),
            ("canceltime".to_string(), FieldValue::from(format_event_time(at))),
        ],
        at,
    )?;
    Ok(event)
}

/// Tunables for [`OrderProducer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSettings {
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            min_quantity: 1,
            max_quantity: 5,
            min_price: 14.99,
            max_price: 89.99,
        }
    }
}

impl OrderSettings {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.min_quantity < 1 || self.min_quantity > self.max_quantity {
            return Err(GeneratorError::Config(format!(
                "invalid quantity range {}..={}",
                self.min_quantity, self.max_quantity
            )));
        }
        let prices_ok = self.min_price >= 0.0
            && self.min_price <= self.max_price
            && self.max_price.is_finite();
        if !prices_ok {
            return Err(GeneratorError::Config(format!(
                "invalid price range {}..={}",
                self.min_price, self.max_price
            )));
        }
        Ok(())
    }

    /// A random order line for `customer` within these ranges.
    pub fn order_line<R: Rng>(&self, rng: &mut R, customer: &Customer) -> OrderLine {
        let product = Product::generate(rng);
        OrderLine {
            id: generate_id(rng),
            customer: customer.clone(),
            description: product.description,
            quantity: generate_int_range(rng, self.min_quantity, self.max_quantity),
            price: generate_money(rng, self.min_price, self.max_price),
            region: pick_str(rng, REGIONS).to_string(),
        }
    }
}

pub struct OrderProducer {
    settings: OrderSettings,
    recent: RecentOrders,
    schema: Arc<EventSchema>,
    rng: StdRng,
}

impl OrderProducer {
    pub fn new(
        settings: OrderSettings,
        recent: RecentOrders,
        rng: StdRng,
    ) -> Result<Self, GeneratorError> {
        settings.validate()?;
        Ok(Self {
            settings,
            recent,
            schema: Arc::new(order_schema()),
            rng,
        })
    }
}

impl Producer for OrderProducer {
    fn name(&self) -> &str {
        "orders"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let customer = Customer::generate(&mut self.rng);
        let line = self.settings.order_line(&mut self.rng, &customer);
        let event = line.to_event(&self.schema, at)?;

        if !self.recent.record(OrderRef {
            id: line.id,
            ordered_at: at,
        }) {
            tracing::debug!(
                "Recent orders busy, order {} not offered for cancellation",
                event.key()
            );
        }
        Ok(vec![event])
    }
}

pub struct CancellationProducer {
    recent: RecentOrders,
    schema: Arc<EventSchema>,
    rng: StdRng,
}

impl CancellationProducer {
    pub fn new(recent: RecentOrders, rng: StdRng) -> Self {
        Self {
            recent,
            schema: Arc::new(cancellation_schema()),
            rng,
        }
    }
}

impl Producer for CancellationProducer {
    fn name(&self) -> &str {
        "cancellations"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let rng = &mut self.rng;
        let order = self.recent.try_take(|len| rng.gen_range(0..len))?;
        let at = not_before(at, Some(order.ordered_at));
        let reason = pick_str(&mut self.rng, CANCEL_REASONS);
        let event = cancellation_event(&self.schema, &mut self.rng, &order.id, reason, at)?;
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;

    fn order_producer(recent: &RecentOrders) -> OrderProducer {
        OrderProducer::new(
            OrderSettings::default(),
            recent.clone(),
            StdRng::seed_from_u64(11),
        )
        .unwrap()
    }

    #[test]
    fn test_order_is_recorded() {
        let recent = RecentOrders::new(10);
        let mut orders = order_producer(&recent);

        let events = orders.produce(Utc::now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].partition(), ORDER_PARTITION);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_recent_orders_bounded() {
        let recent = RecentOrders::new(3);
        let now = Utc::now();
        for i in 0..5 {
            assert!(recent.record(OrderRef {
                id: format!("o-{i}"),
                ordered_at: now,
            }));
        }
        assert_eq!(recent.len(), 3);
        assert_eq!(recent.try_take(|_| 0).unwrap().id, "o-2");
    }

    #[test]
    fn test_cancellation_without_orders_is_transient() {
        let recent = RecentOrders::new(10);
        let mut cancellations = CancellationProducer::new(recent, StdRng::seed_from_u64(5));
        let err = cancellations.produce(Utc::now()).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_order_emitted_when_pool_busy() {
        let recent = RecentOrders::new(10);
        let mut orders = order_producer(&recent);

        let guard = recent.inner.lock().unwrap();
        let events = orders.produce(Utc::now()).unwrap();
        drop(guard);

        assert_eq!(events.len(), 1);
        assert!(recent.is_empty());
    }

    #[test]
    fn test_invalid_order_settings() {
        let settings = OrderSettings {
            min_quantity: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = OrderSettings {
            min_price: 50.0,
            max_price: 10.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(OrderSettings::default().validate().is_ok());
    }

    #[test]
    fn test_cancellation_skips_when_pool_busy() {
        let recent = RecentOrders::new(10);
        recent.record(OrderRef {
            id: "o-1".to_string(),
            ordered_at: Utc::now(),
        });

        let _guard = recent.inner.lock().unwrap();
        let err = recent.try_take(|_| 0).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_cancellation_references_order() {
        let recent = RecentOrders::new(10);
        let mut orders = order_producer(&recent);
        let mut cancellations =
            CancellationProducer::new(recent.clone(), StdRng::seed_from_u64(5));

        let ordered_at = Utc::now();
        let order = orders.produce(ordered_at).unwrap().remove(0);

        // A cancellation is never recorded before its order
        let events = cancellations
            .produce(ordered_at - Duration::minutes(5))
            .unwrap();
        let cancellation = &events[0];

        assert_eq!(cancellation.partition(), CANCELLATION_PARTITION);
        assert_eq!(cancellation.key(), order.key());
        assert_eq!(
            cancellation.get_field("orderid").and_then(|v| v.as_str()),
            Some(order.key())
        );
        assert_eq!(cancellation.recorded_at(), ordered_at);
        assert!(recent.is_empty());

        // Each order is cancelled at most once
        assert!(cancellations.produce(Utc::now()).is_err());
    }
}

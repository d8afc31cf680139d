//! Customers and new-customer registrations.
//!
//! A newly registered customer places a first order a little later. That
//! order is held as a follow-up and, once emitted, is offered to the shared
//! [`RecentOrders`] pool like any other order.

use crate::domain::followup::FollowUps;
use crate::domain::order::{order_schema, OrderRef, OrderSettings, RecentOrders};
use crate::generators::pick::pick_str;
use crate::generators::timestamp::format_event_time;
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Duration, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

pub const PARTITION: &str = "customer";

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bo", "Chidi", "Dana", "Emeka", "Freya", "Gustavo", "Hana", "Ivan", "Jia",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Okafor", "Nakamura", "Silva", "Kowalski", "Haddad", "Nguyen", "Brown",
];

/// Seconds between registration and the first order.
const FIRST_ORDER_DELAY_SECS: (i64, i64) = (30, 600);

/// A customer placing orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
}

impl Customer {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            id: generate_id(rng),
            name: format!(
                "{} {}",
                pick_str(rng, FIRST_NAMES),
                pick_str(rng, LAST_NAMES)
            ),
        }
    }
}

pub fn customer_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("customerid", FieldType::String)
        .field("customername", FieldType::String)
        .field("registered", FieldType::String)
        .build()
}

pub struct NewCustomerProducer {
    orders: OrderSettings,
    recent: RecentOrders,
    schema: Arc<EventSchema>,
    order_schema: Arc<EventSchema>,
    first_orders: FollowUps,
    rng: StdRng,
}

impl NewCustomerProducer {
    pub fn new(
        orders: OrderSettings,
        recent: RecentOrders,
        rng: StdRng,
    ) -> Result<Self, GeneratorError> {
        orders.validate()?;
        Ok(Self {
            orders,
            recent,
            schema: Arc::new(customer_schema()),
            order_schema: Arc::new(order_schema()),
            first_orders: FollowUps::new(),
            rng,
        })
    }

    /// First orders not yet placed.
    pub fn pending_first_orders(&self) -> usize {
        self.first_orders.len()
    }
}

impl Producer for NewCustomerProducer {
    fn name(&self) -> &str {
        "new_customers"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let mut events = self.first_orders.release(at);
        for order in &events {
            self.recent.record(OrderRef {
                id: order.key().to_string(),
                ordered_at: order.recorded_at(),
            });
        }

        let customer = Customer::generate(&mut self.rng);
        let registration = Event::new(
            PARTITION,
            customer.id.clone(),
            Arc::clone(&self.schema),
            vec![
                ("customerid".to_string(), FieldValue::from(customer.id.clone())),
                ("customername".to_string(), FieldValue::from(customer.name.clone())),
                ("registered".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;

        let delay = self
            .rng
            .gen_range(FIRST_ORDER_DELAY_SECS.0..=FIRST_ORDER_DELAY_SECS.1);
        let ordered_at = at + Duration::seconds(delay);
        let first_order = self
            .orders
            .order_line(&mut self.rng, &customer)
            .to_event(&self.order_schema, ordered_at)?;

        events.push(registration);
        self.first_orders.schedule(first_order);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::ORDER_PARTITION;
    use rand::SeedableRng;

    #[test]
    fn test_registration_then_first_order() {
        let recent = RecentOrders::new(10);
        let mut producer = NewCustomerProducer::new(
            OrderSettings::default(),
            recent.clone(),
            StdRng::seed_from_u64(4),
        )
        .unwrap();

        let start = Utc::now();
        let events = producer.produce(start).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].partition(), PARTITION);
        let customer_id = events[0].key().to_string();
        assert_eq!(producer.pending_first_orders(), 1);
        assert!(recent.is_empty());

        let later = start + Duration::seconds(FIRST_ORDER_DELAY_SECS.1);
        let events = producer.produce(later).unwrap();
        let order = events
            .iter()
            .find(|e| e.partition() == ORDER_PARTITION)
            .unwrap();
        assert_eq!(
            order.get_field("customerid").and_then(|v| v.as_str()),
            Some(customer_id.as_str())
        );
        assert!(order.recorded_at() > start && order.recorded_at() <= later);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_generated_customer() {
        let mut rng = StdRng::seed_from_u64(1);
        let customer = Customer::generate(&mut rng);
        assert_eq!(customer.name.split(' ').count(), 2);
        assert_eq!(customer.id.len(), 36);
    }
}

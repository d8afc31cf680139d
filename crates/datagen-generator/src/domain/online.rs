//! Online orders for several products at once.
//!
//! Some online orders run into an item that is out of stock. The warehouse
//! notices shortly after the order is placed, so the out-of-stock event is
//! held and emitted once the producer's clock reaches it.

use crate::domain::customer::Customer;
use crate::domain::followup::FollowUps;
use crate::domain::product::ProductCatalog;
use crate::generators::numeric::generate_money;
use crate::generators::timestamp::format_event_time;
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Duration, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::Rng;
use std::sync::Arc;

pub const ORDER_PARTITION: &str = "online_order";
pub const OUT_OF_STOCK_PARTITION: &str = "out_of_stock";

const UNIT_PRICE: (f64, f64) = (9.99, 119.99);

/// Seconds between the order and the out-of-stock report.
const OUT_OF_STOCK_DELAY_SECS: (i64, i64) = (5, 120);

pub fn online_order_schema() -> EventSchema {
    EventSchema::builder(ORDER_PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("customer", FieldType::String)
        .field("customerid", FieldType::String)
        .field("products", FieldType::String)
        .field("productcount", FieldType::Int64)
        .field("total", FieldType::Float64)
        .field("ordertime", FieldType::String)
        .build()
}

pub fn out_of_stock_schema() -> EventSchema {
    EventSchema::builder(OUT_OF_STOCK_PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("orderid", FieldType::String)
        .field("product", FieldType::String)
        .field("reporttime", FieldType::String)
        .build()
}

/// Tunables for [`OnlineOrderProducer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineOrderSettings {
    /// Most distinct products in one order (capped by the catalog size)
    pub max_products: usize,
    /// Probability that an order hits an out-of-stock product
    pub out_of_stock_probability: f64,
}

impl Default for OnlineOrderSettings {
    fn default() -> Self {
        Self {
            max_products: 4,
            out_of_stock_probability: 0.1,
        }
    }
}

impl OnlineOrderSettings {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.max_products == 0 {
            return Err(GeneratorError::Config(
                "max_products must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.out_of_stock_probability) {
            return Err(GeneratorError::Config(format!(
                "out_of_stock_probability must be between 0 and 1, got {}",
                self.out_of_stock_probability
            )));
        }
        Ok(())
    }
}

pub struct OnlineOrderProducer {
    settings: OnlineOrderSettings,
    catalog: Arc<ProductCatalog>,
    order_schema: Arc<EventSchema>,
    out_of_stock_schema: Arc<EventSchema>,
    reports: FollowUps,
    rng: StdRng,
}

impl OnlineOrderProducer {
    pub fn new(
        settings: OnlineOrderSettings,
        catalog: Arc<ProductCatalog>,
        rng: StdRng,
    ) -> Result<Self, GeneratorError> {
        settings.validate()?;
        if catalog.is_empty() {
            return Err(GeneratorError::Config("product catalog is empty".to_string()));
        }
        Ok(Self {
            settings,
            catalog,
            order_schema: Arc::new(online_order_schema()),
            out_of_stock_schema: Arc::new(out_of_stock_schema()),
            reports: FollowUps::new(),
            rng,
        })
    }

    /// Out-of-stock reports not yet emitted.
    pub fn pending_reports(&self) -> usize {
        self.reports.len()
    }

    fn out_of_stock_event(
        &mut self,
        order_id: &str,
        sku: &str,
        at: DateTime<Utc>,
    ) -> Result<Event, GeneratorError> {
        let event = Event::new(
            OUT_OF_STOCK_PARTITION,
            order_id.to_string(),
            Arc::clone(&self.out_of_stock_schema),
            vec![
                ("id".to_string(), FieldValue::from(generate_id(&mut self.rng))),
                ("orderid".to_string(), FieldValue::from(order_id)),
                ("product".to_string(), FieldValue::from(sku)),
                ("reporttime".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;
        Ok(event)
    }
}

impl Producer for OnlineOrderProducer {
    fn name(&self) -> &str {
        "online_orders"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let customer = Customer::generate(&mut self.rng);
        let most = self.settings.max_products.min(self.catalog.len());
        let count = self.rng.gen_range(1..=most);
        let skus: Vec<String> = sample(&mut self.rng, self.catalog.len(), count)
            .into_iter()
            .map(|i| self.catalog.products()[i].sku.clone())
            .collect();
        let total: f64 = skus
            .iter()
            .map(|_| generate_money(&mut self.rng, UNIT_PRICE.0, UNIT_PRICE.1))
            .sum();

        let id = generate_id(&mut self.rng);
        let order = Event::new(
            ORDER_PARTITION,
            id.clone(),
            Arc::clone(&self.order_schema),
            vec![
                ("id".to_string(), FieldValue::from(id.clone())),
                ("customer".to_string(), FieldValue::from(customer.name)),
                ("customerid".to_string(), FieldValue::from(customer.id)),
                ("products".to_string(), FieldValue::from(skus.join(", "))),
                ("productcount".to_string(), FieldValue::from(count as i64)),
                ("total".to_string(), FieldValue::from((total * 100.0).round() / 100.0)),
                ("ordertime".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;

        let report = if self.rng.gen_bool(self.settings.out_of_stock_probability) {
            let sku = skus[self.rng.gen_range(0..skus.len())].clone();
            let delay = self
                .rng
                .gen_range(OUT_OF_STOCK_DELAY_SECS.0..=OUT_OF_STOCK_DELAY_SECS.1);
            Some(self.out_of_stock_event(&id, &sku, at + Duration::seconds(delay))?)
        } else {
            None
        };

        let mut events = self.reports.release(at);
        events.push(order);
        if let Some(report) = report {
            self.reports.schedule(report);
        }
        Ok(events)
    }
}

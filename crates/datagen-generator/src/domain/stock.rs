//! Stock moving in and out of the warehouses.

use crate::domain::product::ProductCatalog;
use crate::generators::numeric::generate_int_range;
use crate::generators::pick::pick_str;
use crate::generators::timestamp::format_event_time;
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

pub const PARTITION: &str = "stock_movement";

const WAREHOUSES: &[&str] = &["NorthWarehouse", "SouthWarehouse", "EastDistribution"];

/// Deliveries bring in more units than a single pick takes out.
const INBOUND_UNITS: (i64, i64) = (10, 200);
const OUTBOUND_UNITS: (i64, i64) = (1, 20);

pub fn stock_movement_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("product", FieldType::String)
        .field("warehouse", FieldType::String)
        .field("direction", FieldType::String)
        .field("quantity", FieldType::Int64)
        .field("movementtime", FieldType::String)
        .build()
}

pub struct StockMovementProducer {
    catalog: Arc<ProductCatalog>,
    schema: Arc<EventSchema>,
    rng: StdRng,
}

impl StockMovementProducer {
    pub fn new(catalog: Arc<ProductCatalog>, rng: StdRng) -> Result<Self, GeneratorError> {
        if catalog.is_empty() {
            return Err(GeneratorError::Config("product catalog is empty".to_string()));
        }
        Ok(Self {
            catalog,
            schema: Arc::new(stock_movement_schema()),
            rng,
        })
    }
}

impl Producer for StockMovementProducer {
    fn name(&self) -> &str {
        "stock_movements"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let index = self.rng.gen_range(0..self.catalog.len());
        let sku = self.catalog.products()[index].sku.clone();

        let (direction, (min, max)) = if self.rng.gen_bool(0.5) {
            ("IN", INBOUND_UNITS)
        } else {
            ("OUT", OUTBOUND_UNITS)
        };
        let quantity = generate_int_range(&mut self.rng, min, max);

        // Keyed by product so each product's movements stay together
        let event = Event::new(
            PARTITION,
            sku.clone(),
            Arc::clone(&self.schema),
            vec![
                ("id".to_string(), FieldValue::from(generate_id(&mut self.rng))),
                ("product".to_string(), FieldValue::from(sku)),
                (
                    "warehouse".to_string(),
                    FieldValue::from(pick_str(&mut self.rng, WAREHOUSES)),
                ),
                ("direction".to_string(), FieldValue::from(direction)),
                ("quantity".to_string(), FieldValue::from(quantity)),
                ("movementtime".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;
        Ok(vec![event])
    }
}

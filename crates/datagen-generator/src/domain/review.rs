//! Product reviews.
//!
//! Products with a known size issue attract low-rated reviews that mention
//! the fit, so downstream pipelines have a pattern to detect.

use crate::domain::product::{Product, ProductCatalog};
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

pub const PARTITION: &str = "product_review";

const POSITIVE: &[&str] = &[
    "Great quality, would buy again",
    "Fits perfectly",
    "Comfortable and well made",
    "Exactly as described",
];
const SIZE_COMPLAINTS: &[&str] = &[
    "Runs very small, had to return",
    "Much tighter than the size chart suggests",
    "Size is way off",
];

pub fn review_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("product", FieldType::String)
        .field("size", FieldType::String)
        .field("rating", FieldType::Int64)
        .field("size_issue", FieldType::Bool)
        .field("review", FieldType::String)
        .field("reviewtime", FieldType::String)
        .build()
}

/// Tunables for [`ProductReviewProducer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSettings {
    /// Number of products in the catalog
    pub catalog_size: usize,
    /// Number of those products with a known size issue
    pub products_with_size_issue: usize,
    /// Probability that a review of a defective product reports the issue
    pub size_issue_probability: f64,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            catalog_size: 50,
            products_with_size_issue: 0,
            size_issue_probability: 0.8,
        }
    }
}

impl ReviewSettings {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(0.0..=1.0).contains(&self.size_issue_probability) {
            return Err(GeneratorError::Config(format!(
                "size_issue_probability must be between 0 and 1, got {}",
                self.size_issue_probability
            )));
        }
        if self.catalog_size == 0 {
            return Err(GeneratorError::Config(
                "catalog_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate the product catalog shared by every producer that deals in
    /// products.
    pub fn build_catalog<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Arc<ProductCatalog>, GeneratorError> {
        self.validate()?;
        let catalog =
            ProductCatalog::generate(rng, self.catalog_size, self.products_with_size_issue);
        if !catalog.with_size_issue().is_empty() {
            let names: Vec<String> = catalog
                .with_size_issue()
                .iter()
                .map(|p| p.to_string())
                .collect();
            tracing::info!("Products that have a size issue: {}", names.join(", "));
        }
        Ok(Arc::new(catalog))
    }
}

/// Build one review of `product`.
///
/// A review that reports the size issue gets a rating of 1 or 2 and a fit
/// complaint, any other review a rating of 3 to 5.
pub fn review_event<R: Rng>(
    schema: &Arc<EventSchema>,
    rng: &mut R,
    product: &Product,
    size_issue: bool,
    at: DateTime<Utc>,
) -> Result<Event, GeneratorError> {
    let (rating, review) = if size_issue {
        (generate_int_range(rng, 1, 2), pick_str(rng, SIZE_COMPLAINTS))
    } else {
        (generate_int_range(rng, 3, 5), pick_str(rng, POSITIVE))
    };

    let id = generate_id(rng);
    let event = Event::new(
        PARTITION,
        id.clone(),
        Arc::clone(schema),
        vec![
            ("id".to_string(), FieldValue::from(id)),
            ("product".to_string(), FieldValue::from(product.sku.clone())),
            ("size".to_string(), FieldValue::from(product.size.clone())),
            ("rating".to_string(), FieldValue::from(rating)),
            ("size_issue".to_string(), FieldValue::from(size_issue)),
            ("review".to_string(), FieldValue::from(review)),
            ("reviewtime".to_string(), FieldValue::from(format_event_time(at))),
        ],
        at,
    )?;
    Ok(event)
}

pub struct ProductReviewProducer {
    settings: ReviewSettings,
    catalog: Arc<ProductCatalog>,
    schema: Arc<EventSchema>,
    rng: StdRng,
}

impl ProductReviewProducer {
    pub fn new(
        settings: ReviewSettings,
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
            schema: Arc::new(review_schema()),
            rng,
        })
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }
}

impl Producer for ProductReviewProducer {
    fn name(&self) -> &str {
        "product_reviews"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let index = self.rng.gen_range(0..self.catalog.len());
        let product = &self.catalog.products()[index];
        let size_issue = self.catalog.has_size_issue(index)
            && self.rng.gen_bool(self.settings.size_issue_probability);

        let event = review_event(&self.schema, &mut self.rng, product, size_issue, at)?;
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn producer(settings: ReviewSettings) -> ProductReviewProducer {
        let mut rng = StdRng::seed_from_u64(7);
        let catalog = settings.build_catalog(&mut rng).unwrap();
        ProductReviewProducer::new(settings, catalog, rng).unwrap()
    }

    #[test]
    fn test_reviews_without_size_issues_are_positive() {
        let mut producer = producer(ReviewSettings::default());
        for _ in 0..200 {
            let events = producer.produce(Utc::now()).unwrap();
            let event = &events[0];
            assert_eq!(event.partition(), PARTITION);
            assert_eq!(event.get_field("size_issue"), Some(&FieldValue::Bool(false)));
            let rating = event.get_field("rating").and_then(|v| v.as_i64()).unwrap();
            assert!((3..=5).contains(&rating));
        }
    }

    #[test]
    fn test_size_issue_products_get_low_ratings() {
        let settings = ReviewSettings {
            catalog_size: 4,
            products_with_size_issue: 4,
            size_issue_probability: 1.0,
        };
        let mut producer = producer(settings);
        let defective: Vec<String> = producer
            .catalog()
            .with_size_issue()
            .iter()
            .map(|p| p.sku.clone())
            .collect();

        for _ in 0..100 {
            let events = producer.produce(Utc::now()).unwrap();
            let event = &events[0];
            let sku = event.get_field("product").and_then(|v| v.as_str()).unwrap();
            assert!(defective.iter().any(|d| d == sku));
            assert_eq!(event.get_field("size_issue"), Some(&FieldValue::Bool(true)));
            let rating = event.get_field("rating").and_then(|v| v.as_i64()).unwrap();
            assert!((1..=2).contains(&rating));
        }
    }

    #[test]
    fn test_invalid_settings() {
        let settings = ReviewSettings {
            size_issue_probability: -0.1,
            ..Default::default()
        };
        assert!(settings.build_catalog(&mut StdRng::seed_from_u64(1)).is_err());

        let empty = Arc::new(ProductCatalog::default());
        assert!(
            ProductReviewProducer::new(ReviewSettings::default(), empty, StdRng::seed_from_u64(1))
                .is_err()
        );
    }
}

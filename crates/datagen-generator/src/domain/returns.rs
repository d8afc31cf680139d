//! Return requests.
//!
//! Returns draw from the same catalog as reviews. A product with a known
//! size issue is mostly returned for the fit, and a customer who returns it
//! for that reason follows up with a low-rated review a little later.

use crate::domain::followup::FollowUps;
use crate::domain::product::ProductCatalog;
use crate::domain::review::{review_event, review_schema, ReviewSettings};
use crate::generators::pick::pick_str;
use crate::generators::timestamp::format_event_time;
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Duration, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

pub const PARTITION: &str = "return_request";

pub const SIZE_REASON: &str = "WRONG_SIZE";
const OTHER_REASONS: &[&str] = &["DAMAGED", "NOT_AS_DESCRIBED", "CHANGED_MIND", "ARRIVED_LATE"];

/// Seconds between a size return and the review that follows it.
const REVIEW_DELAY_SECS: (i64, i64) = (300, 3_600);

pub fn return_request_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("product", FieldType::String)
        .field("size", FieldType::String)
        .field("reason", FieldType::String)
        .field("returntime", FieldType::String)
        .build()
}

pub struct ReturnRequestProducer {
    settings: ReviewSettings,
    catalog: Arc<ProductCatalog>,
    schema: Arc<EventSchema>,
    review_schema: Arc<EventSchema>,
    reviews: FollowUps,
    rng: StdRng,
}

impl ReturnRequestProducer {
    /// `settings.size_issue_probability` is the chance that a return of a
    /// product with a size issue gives the fit as the reason.
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
            schema: Arc::new(return_request_schema()),
            review_schema: Arc::new(review_schema()),
            reviews: FollowUps::new(),
            rng,
        })
    }

    /// Follow-up reviews not yet emitted.
    pub fn pending_reviews(&self) -> usize {
        self.reviews.len()
    }
}

impl Producer for ReturnRequestProducer {
    fn name(&self) -> &str {
        "return_requests"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let index = self.rng.gen_range(0..self.catalog.len());
        let product = &self.catalog.products()[index];
        let size_issue = self.catalog.has_size_issue(index)
            && self.rng.gen_bool(self.settings.size_issue_probability);
        let reason = if size_issue {
            SIZE_REASON
        } else {
            pick_str(&mut self.rng, OTHER_REASONS)
        };

        let id = generate_id(&mut self.rng);
        let request = Event::new(
            PARTITION,
            id.clone(),
            Arc::clone(&self.schema),
            vec![
                ("id".to_string(), FieldValue::from(id)),
                ("product".to_string(), FieldValue::from(product.sku.clone())),
                ("size".to_string(), FieldValue::from(product.size.clone())),
                ("reason".to_string(), FieldValue::from(reason)),
                ("returntime".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;

        let review = if size_issue {
            let delay = self
                .rng
                .gen_range(REVIEW_DELAY_SECS.0..=REVIEW_DELAY_SECS.1);
            Some(review_event(
                &self.review_schema,
                &mut self.rng,
                product,
                true,
                at + Duration::seconds(delay),
            )?)
        } else {
            None
        };

        let mut events = self.reviews.release(at);
        events.push(request);
        if let Some(review) = review {
            self.reviews.schedule(review);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::PARTITION as REVIEW_PARTITION;
    use rand::SeedableRng;

    fn producer(settings: ReviewSettings) -> (ReturnRequestProducer, Arc<ProductCatalog>) {
        let mut rng = StdRng::seed_from_u64(13);
        let catalog = settings.build_catalog(&mut rng).unwrap();
        let producer =
            ReturnRequestProducer::new(settings, Arc::clone(&catalog), rng).unwrap();
        (producer, catalog)
    }

    #[test]
    fn test_size_returns_are_followed_by_low_reviews() {
        let (mut producer, catalog) = producer(ReviewSettings {
            catalog_size: 3,
            products_with_size_issue: 3,
            size_issue_probability: 1.0,
        });

        let start = Utc::now();
        let first = producer.produce(start).unwrap();
        assert_eq!(first.len(), 1);
        let request = &first[0];
        assert_eq!(request.partition(), PARTITION);
        assert_eq!(
            request.get_field("reason").and_then(|v| v.as_str()),
            Some(SIZE_REASON)
        );
        assert_eq!(producer.pending_reviews(), 1);

        let later = start + Duration::seconds(REVIEW_DELAY_SECS.1);
        let second = producer.produce(later).unwrap();
        let review = &second[0];
        assert_eq!(review.partition(), REVIEW_PARTITION);
        assert_eq!(review.get_field("product"), request.get_field("product"));
        assert_eq!(review.get_field("size_issue"), Some(&FieldValue::Bool(true)));
        let rating = review.get_field("rating").and_then(|v| v.as_i64()).unwrap();
        assert!((1..=2).contains(&rating));
        assert!(review.recorded_at() > start && review.recorded_at() <= later);

        let sku = request.get_field("product").and_then(|v| v.as_str()).unwrap();
        assert!(catalog.with_size_issue().iter().any(|p| p.sku == sku));
    }

    #[test]
    fn test_returns_without_size_issue_give_other_reasons() {
        let (mut producer, _) = producer(ReviewSettings::default());
        for _ in 0..100 {
            let events = producer.produce(Utc::now()).unwrap();
            assert_eq!(events.len(), 1);
            let reason = events[0].get_field("reason").and_then(|v| v.as_str()).unwrap();
            assert!(OTHER_REASONS.contains(&reason));
        }
        assert_eq!(producer.pending_reviews(), 0);
    }
}

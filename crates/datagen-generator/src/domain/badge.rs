//! Employees badging in at warehouse doors.

use crate::generators::numeric::generate_int_range;
use crate::generators::pick::{pick, pick_str};
use crate::generators::timestamp::format_event_time;
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use std::sync::Arc;

pub const PARTITION: &str = "badge_in";

/// Size of the fixed workforce that badges in.
pub const EMPLOYEE_COUNT: usize = 40;

const DOORS: &[&str] = &[
    "NorthWarehouse:MainEntrance",
    "NorthWarehouse:LoadingBay",
    "SouthWarehouse:MainEntrance",
    "SouthWarehouse:ColdStore",
    "EastDistribution:Gate-2",
];

pub fn badge_in_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("employee", FieldType::String)
        .field("door", FieldType::String)
        .field("badgetime", FieldType::String)
        .build()
}

pub struct BadgeInProducer {
    employees: Vec<String>,
    schema: Arc<EventSchema>,
    rng: StdRng,
}

impl BadgeInProducer {
    pub fn new(mut rng: StdRng) -> Self {
        let employees = (0..EMPLOYEE_COUNT)
            .map(|_| format!("E{:05}", generate_int_range(&mut rng, 1, 99_999)))
            .collect();
        Self {
            employees,
            schema: Arc::new(badge_in_schema()),
            rng,
        }
    }

    pub fn employees(&self) -> &[String] {
        &self.employees
    }
}

impl Producer for BadgeInProducer {
    fn name(&self) -> &str {
        "badge_ins"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let employee = pick(&mut self.rng, &self.employees)
            .cloned()
            .ok_or_else(|| GeneratorError::NoEligibleEntity("employee".to_string()))?;

        let event = Event::new(
            PARTITION,
            employee.clone(),
            Arc::clone(&self.schema),
            vec![
                ("id".to_string(), FieldValue::from(generate_id(&mut self.rng))),
                ("employee".to_string(), FieldValue::from(employee)),
                ("door".to_string(), FieldValue::from(pick_str(&mut self.rng, DOORS))),
                ("badgetime".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_badge_in_by_known_employee() {
        let mut producer = BadgeInProducer::new(StdRng::seed_from_u64(8));
        assert_eq!(producer.employees().len(), EMPLOYEE_COUNT);

        let at = Utc::now();
        let events = producer.produce(at).unwrap();
        let event = &events[0];
        assert_eq!(event.partition(), PARTITION);
        assert_eq!(event.recorded_at(), at);
        assert!(producer.employees().iter().any(|e| e == event.key()));
        let door = event.get_field("door").and_then(|v| v.as_str()).unwrap();
        assert!(DOORS.contains(&door));
    }
}

//! IoT sensor readings from the warehouses.
//!
//! Normal readings arrive often. A second, much rarer producer emits readings
//! from the same sensors with an abnormally high temperature.

use crate::generators::numeric::generate_float_range;
use crate::generators::pick::pick_str;
use crate::generators::timestamp::format_event_time;
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use std::sync::Arc;

pub const PARTITION: &str = "sensor_reading";

const SENSORS: &[&str] = &[
    "NorthWarehouse:A-1-01",
    "NorthWarehouse:A-2-04",
    "NorthWarehouse:B-1-02",
    "SouthWarehouse:A-1-07",
    "SouthWarehouse:C-3-03",
    "EastDistribution:D-1-09",
];

pub fn sensor_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("sensorid", FieldType::String)
        .field("temperature", FieldType::Float64)
        .field("humidity", FieldType::Float64)
        .field("sensortime", FieldType::String)
        .build()
}

/// Job name and temperature range of one kind of reading.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SensorProfile {
    name: &'static str,
    temperature: (f64, f64),
}

const NORMAL: SensorProfile = SensorProfile {
    name: "sensor_readings",
    temperature: (17.0, 24.0),
};

const HIGH: SensorProfile = SensorProfile {
    name: "high_sensor_readings",
    temperature: (31.0, 45.0),
};

pub struct SensorReadingProducer {
    profile: SensorProfile,
    schema: Arc<EventSchema>,
    rng: StdRng,
}

impl SensorReadingProducer {
    pub fn new(rng: StdRng) -> Self {
        Self::with_profile(NORMAL, rng)
    }

    /// Readings with an abnormally high temperature.
    pub fn high(rng: StdRng) -> Self {
        Self::with_profile(HIGH, rng)
    }

    fn with_profile(profile: SensorProfile, rng: StdRng) -> Self {
        Self {
            profile,
            schema: Arc::new(sensor_schema()),
            rng,
        }
    }
}

impl Producer for SensorReadingProducer {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let sensor = pick_str(&mut self.rng, SENSORS);
        let (low, high) = self.profile.temperature;
        let temperature = (generate_float_range(&mut self.rng, low, high) * 10.0).round() / 10.0;
        let humidity = (generate_float_range(&mut self.rng, 40.0, 55.0) * 10.0).round() / 10.0;

        let event = Event::new(
            PARTITION,
            generate_id(&mut self.rng),
            Arc::clone(&self.schema),
            vec![
                ("sensorid".to_string(), FieldValue::from(sensor)),
                ("temperature".to_string(), FieldValue::from(temperature)),
                ("humidity".to_string(), FieldValue::from(humidity)),
                ("sensortime".to_string(), FieldValue::from(format_event_time(at))),
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
    fn test_sensor_reading() {
        let mut producer = SensorReadingProducer::new(StdRng::seed_from_u64(3));
        let at = Utc::now();
        let events = producer.produce(at).unwrap();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.partition(), PARTITION);
        assert_eq!(event.recorded_at(), at);
        let sensor = event.get_field("sensorid").and_then(|v| v.as_str()).unwrap();
        assert!(SENSORS.contains(&sensor));
        let temperature = event
            .get_field("temperature")
            .and_then(|v| v.as_f64())
            .unwrap();
        assert!((17.0..=24.0).contains(&temperature));
    }

    #[test]
    fn test_high_readings_share_partition_and_sensors() {
        let mut producer = SensorReadingProducer::high(StdRng::seed_from_u64(3));
        assert_eq!(producer.name(), "high_sensor_readings");
        for _ in 0..50 {
            let events = producer.produce(Utc::now()).unwrap();
            let event = &events[0];
            assert_eq!(event.partition(), PARTITION);
            let sensor = event.get_field("sensorid").and_then(|v| v.as_str()).unwrap();
            assert!(SENSORS.contains(&sensor));
            let temperature = event
                .get_field("temperature")
                .and_then(|v| v.as_f64())
                .unwrap();
            assert!(temperature > 24.0 && temperature <= 45.0);
        }
    }
}

//! Multi-step transactions.
//!
//! A transaction emits one event per state, strictly in the order
//! `STARTED`, `PROCESSING`, `PROCESSING`, `COMPLETED`. When a transaction is
//! created it is classified once as either completing or abandoned; an
//! abandoned transaction stops after the second `PROCESSING` and never
//! reaches `COMPLETED`.
//!
//! In-flight transactions live in an arena keyed by id. Each firing either
//! starts a new transaction or advances the transaction at the front of a
//! round-robin queue, so every in-flight transaction is eventually finished.

use crate::generators::numeric::generate_money;
use crate::generators::timestamp::{format_event_time, not_before};
use crate::generators::uuid::generate_id;
use crate::producer::{GeneratorError, Producer};
use chrono::{DateTime, Utc};
use datagen_core::{Event, EventSchema, FieldType, FieldValue};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Partition key of transaction events.
pub const PARTITION: &str = "transaction";

/// States of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Started,
    Processing,
    Completed,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Started => "STARTED",
            TransactionState::Processing => "PROCESSING",
            TransactionState::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full ordered sequence of a completing transaction.
pub const SEQUENCE: [TransactionState; 4] = [
    TransactionState::Started,
    TransactionState::Processing,
    TransactionState::Processing,
    TransactionState::Completed,
];

/// Index in [`SEQUENCE`] of the last state an abandoned transaction emits.
const ABANDON_AFTER: usize = 2;

/// Schema for transaction events - all fields are required.
pub fn transaction_schema() -> EventSchema {
    EventSchema::builder(PARTITION)
        .version(1)
        .field("id", FieldType::String)
        .field("state", FieldType::String)
        .field("amount", FieldType::Float64)
        .field("timestamp", FieldType::String)
        .build()
}

/// Tunables for [`TransactionProducer`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSettings {
    /// Probability that a new transaction is abandoned
    pub abandon_probability: f64,
    /// Probability that a firing starts a new transaction while others are in flight
    pub new_transaction_probability: f64,
    /// Upper bound on concurrently in-flight transactions
    pub max_in_flight: usize,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            abandon_probability: 0.5,
            new_transaction_probability: 0.3,
            max_in_flight: 10,
            min_amount: 5.0,
            max_amount: 500.0,
        }
    }
}

impl TransactionSettings {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        for (name, p) in [
            ("abandon_probability", self.abandon_probability),
            ("new_transaction_probability", self.new_transaction_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GeneratorError::Config(format!(
                    "{name} must be between 0 and 1, got {p}"
                )));
            }
        }
        if self.max_in_flight == 0 {
            return Err(GeneratorError::Config(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        let amounts_ok = self.min_amount >= 0.0
            && self.min_amount <= self.max_amount
            && self.max_amount.is_finite();
        if !amounts_ok {
            return Err(GeneratorError::Config(format!(
                "invalid amount range {}..={}",
                self.min_amount, self.max_amount
            )));
        }
        Ok(())
    }
}

/// One in-flight transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    id: String,
    amount: f64,
    completing: bool,
    emitted: usize,
    last_emitted: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    pub fn new(id: impl Into<String>, amount: f64, completing: bool) -> Self {
        Self {
            id: id.into(),
            amount,
            completing,
            emitted: 0,
            last_emitted: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this transaction will reach `COMPLETED`.
    pub fn is_completing(&self) -> bool {
        self.completing
    }

    /// Number of state events emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn final_step(&self) -> usize {
        if self.completing {
            SEQUENCE.len() - 1
        } else {
            ABANDON_AFTER
        }
    }

    /// The state the next call to [`advance`](Self::advance) will emit.
    pub fn next_state(&self) -> Option<TransactionState> {
        if self.emitted > self.final_step() {
            None
        } else {
            Some(SEQUENCE[self.emitted])
        }
    }

    /// Emit the event for the next state.
    ///
    /// Returns the event and whether the transaction is still in flight.
    /// The event is built before any state changes, so a payload failure
    /// leaves the record untouched for a later retry.
    pub fn advance(
        &mut self,
        schema: &Arc<EventSchema>,
        at: DateTime<Utc>,
    ) -> Result<(Event, bool), GeneratorError> {
        let Some(state) = self.next_state() else {
            return Err(GeneratorError::NoEligibleEntity(format!(
                "transaction {} already finished",
                self.id
            )));
        };
        let at = not_before(at, self.last_emitted);

        let event = Event::new(
            PARTITION,
            self.id.clone(),
            Arc::clone(schema),
            vec![
                ("id".to_string(), FieldValue::from(self.id.clone())),
                ("state".to_string(), FieldValue::from(state.as_str())),
                ("amount".to_string(), FieldValue::from(self.amount)),
                ("timestamp".to_string(), FieldValue::from(format_event_time(at))),
            ],
            at,
        )?;

        self.emitted += 1;
        self.last_emitted = Some(at);
        Ok((event, self.emitted <= self.final_step()))
    }
}

/// Running totals of a [`TransactionProducer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub started: u64,
    pub completed: u64,
    pub abandoned: u64,
}

/// Producer of transaction lifecycles.
pub struct TransactionProducer {
    settings: TransactionSettings,
    schema: Arc<EventSchema>,
    rng: StdRng,
    in_flight: HashMap<String, TransactionRecord>,
    round_robin: VecDeque<String>,
    stats: TransactionStats,
}

impl TransactionProducer {
    pub fn new(settings: TransactionSettings, rng: StdRng) -> Result<Self, GeneratorError> {
        settings.validate()?;
        Ok(Self {
            settings,
            schema: Arc::new(transaction_schema()),
            rng,
            in_flight: HashMap::new(),
            round_robin: VecDeque::new(),
            stats: TransactionStats::default(),
        })
    }

    /// Replace the event schema.
    pub fn with_schema(mut self, schema: EventSchema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn in_flight(&self, id: &str) -> Option<&TransactionRecord> {
        self.in_flight.get(id)
    }

    pub fn stats(&self) -> TransactionStats {
        self.stats
    }

    fn should_start_new(&mut self) -> bool {
        if self.in_flight.is_empty() {
            return true;
        }
        self.in_flight.len() < self.settings.max_in_flight
            && self
                .rng
                .gen_bool(self.settings.new_transaction_probability)
    }

    fn start_new(&mut self, at: DateTime<Utc>) -> Result<Event, GeneratorError> {
        let id = generate_id(&mut self.rng);
        let amount = generate_money(
            &mut self.rng,
            self.settings.min_amount,
            self.settings.max_amount,
        );
        let completing = !self.rng.gen_bool(self.settings.abandon_probability);

        let mut record = TransactionRecord::new(id.clone(), amount, completing);
        let (event, still_in_flight) = record.advance(&self.schema, at)?;

        self.stats.started += 1;
        if still_in_flight {
            self.in_flight.insert(id.clone(), record);
            self.round_robin.push_back(id);
        }
        Ok(event)
    }

    fn advance_next(&mut self, at: DateTime<Utc>) -> Result<Event, GeneratorError> {
        let Some(id) = self.round_robin.pop_front() else {
            return Err(GeneratorError::NoEligibleEntity(
                "no transaction in flight".to_string(),
            ));
        };
        let Some(record) = self.in_flight.get_mut(&id) else {
            return Err(GeneratorError::NoEligibleEntity(format!(
                "transaction {id} is no longer in flight"
            )));
        };

        match record.advance(&self.schema, at) {
            Ok((event, true)) => {
                self.round_robin.push_back(id);
                Ok(event)
            }
            Ok((event, false)) => {
                if let Some(finished) = self.in_flight.remove(&id) {
                    if finished.is_completing() {
                        self.stats.completed += 1;
                    } else {
                        self.stats.abandoned += 1;
                    }
                }
                Ok(event)
            }
            Err(e) => {
                self.round_robin.push_front(id);
                Err(e)
            }
        }
    }
}

impl Producer for TransactionProducer {
    fn name(&self) -> &str {
        "transactions"
    }

    fn produce(&mut self, at: DateTime<Utc>) -> Result<Vec<Event>, GeneratorError> {
        let event = if self.should_start_new() {
            self.start_new(at)?
        } else {
            self.advance_next(at)?
        };
        tracing::trace!(
            "Transaction {} -> {:?}",
            event.key(),
            event.get_field("state")
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;

    fn producer(settings: TransactionSettings) -> TransactionProducer {
        TransactionProducer::new(settings, StdRng::seed_from_u64(42)).unwrap()
    }

    fn state_of(event: &Event) -> &str {
        event.get_field("state").and_then(|v| v.as_str()).unwrap()
    }

    #[test]
    fn test_record_completing_sequence() {
        let schema = Arc::new(transaction_schema());
        let mut record = TransactionRecord::new("t-1", 10.0, true);
        let now = Utc::now();

        let mut states = Vec::new();
        loop {
            let (event, in_flight) = record.advance(&schema, now).unwrap();
            states.push(state_of(&event).to_string());
            if !in_flight {
                break;
            }
        }
        assert_eq!(states, ["STARTED", "PROCESSING", "PROCESSING", "COMPLETED"]);
        assert_eq!(record.next_state(), None);
        assert!(record.advance(&schema, now).is_err());
    }

    #[test]
    fn test_record_abandoned_sequence() {
        let schema = Arc::new(transaction_schema());
        let mut record = TransactionRecord::new("t-2", 10.0, false);
        let now = Utc::now();

        let mut states = Vec::new();
        loop {
            let (event, in_flight) = record.advance(&schema, now).unwrap();
            states.push(state_of(&event).to_string());
            if !in_flight {
                break;
            }
        }
        assert_eq!(states, ["STARTED", "PROCESSING", "PROCESSING"]);
    }

    #[test]
    fn test_record_timestamps_never_go_backwards() {
        let schema = Arc::new(transaction_schema());
        let mut record = TransactionRecord::new("t-3", 10.0, true);
        let now = Utc::now();

        let (first, _) = record.advance(&schema, now).unwrap();
        let (second, _) = record.advance(&schema, now - Duration::hours(1)).unwrap();
        assert_eq!(second.recorded_at(), first.recorded_at());
    }

    #[test]
    fn test_payload_failure_leaves_state_unchanged() {
        let broken = Arc::new(
            EventSchema::builder(PARTITION)
                .field("id", FieldType::String)
                .field("state", FieldType::String)
                .build(),
        );
        let mut record = TransactionRecord::new("t-4", 10.0, true);

        assert!(record.advance(&broken, Utc::now()).is_err());
        assert_eq!(record.emitted(), 0);
        assert_eq!(record.next_state(), Some(TransactionState::Started));

        let schema = Arc::new(transaction_schema());
        let (event, _) = record.advance(&schema, Utc::now()).unwrap();
        assert_eq!(state_of(&event), "STARTED");
    }

    #[test]
    fn test_failed_firing_is_skipped_by_producer() {
        let mut p = producer(TransactionSettings::default()).with_schema(
            EventSchema::builder(PARTITION)
                .field("id", FieldType::String)
                .build(),
        );
        let err = p.produce(Utc::now()).unwrap_err();
        assert!(matches!(err, GeneratorError::Payload(_)));
        assert_eq!(p.in_flight_count(), 0);
        assert_eq!(p.stats().started, 0);
    }

    #[test]
    fn test_states_in_order_per_entity() {
        let mut p = producer(TransactionSettings::default());
        let mut per_entity: HashMap<String, Vec<String>> = HashMap::new();
        let start = Utc::now();

        for i in 0..5_000 {
            for event in p.produce(start + Duration::seconds(i)).unwrap() {
                per_entity
                    .entry(event.key().to_string())
                    .or_default()
                    .push(state_of(&event).to_string());
            }
        }

        let full: Vec<&str> = SEQUENCE.iter().map(|s| s.as_str()).collect();
        for states in per_entity.values() {
            assert!(states.len() <= full.len());
            assert_eq!(states.as_slice(), &full[..states.len()]);
        }
    }

    #[test]
    fn test_every_entity_is_eventually_finished() {
        let settings = TransactionSettings {
            new_transaction_probability: 1.0,
            max_in_flight: 4,
            ..Default::default()
        };
        let mut p = producer(settings);
        let now = Utc::now();

        for _ in 0..1_000 {
            p.produce(now).unwrap();
            assert!(p.in_flight_count() <= 4);
        }

        let stats = p.stats();
        assert_eq!(
            stats.started,
            stats.completed + stats.abandoned + p.in_flight_count() as u64
        );
        assert!(stats.completed > 0);
        assert!(stats.abandoned > 0);
    }

    #[test]
    fn test_completion_fraction_matches_probability() {
        let mut p = producer(TransactionSettings::default());
        let now = Utc::now();

        while p.stats().completed + p.stats().abandoned < 10_000 {
            p.produce(now).unwrap();
        }

        let stats = p.stats();
        let finished = (stats.completed + stats.abandoned) as f64;
        let fraction = stats.completed as f64 / finished;
        assert!(
            (fraction - 0.5).abs() < 0.02,
            "completed fraction {fraction} outside tolerance"
        );
    }

    #[test]
    fn test_abandon_probability_extremes() {
        let mut always = producer(TransactionSettings {
            abandon_probability: 1.0,
            ..Default::default()
        });
        let mut never = producer(TransactionSettings {
            abandon_probability: 0.0,
            ..Default::default()
        });
        let now = Utc::now();
        for _ in 0..500 {
            always.produce(now).unwrap();
            never.produce(now).unwrap();
        }
        assert_eq!(always.stats().completed, 0);
        assert_eq!(never.stats().abandoned, 0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = TransactionProducer::new(
            TransactionSettings {
                abandon_probability: 1.5,
                ..Default::default()
            },
            StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(GeneratorError::Config(_))));

        let result = TransactionProducer::new(
            TransactionSettings {
                max_in_flight: 0,
                ..Default::default()
            },
            StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(GeneratorError::Config(_))));
    }
}

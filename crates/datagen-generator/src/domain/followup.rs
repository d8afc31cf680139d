//! Events that a producer decided on earlier but that belong to a later time.
//!
//! Patterns such as "a large order, cancelled a few minutes later" are built
//! in full when they start, then held here until the producer's clock
//! reaches each event's recorded time. The same holding pen works for live
//! traffic and for a simulated clock, and never emits an event stamped after
//! the firing that releases it.

use chrono::{DateTime, Utc};
use datagen_core::Event;

/// Upper bound on held events per producer.
pub const MAX_PENDING: usize = 10_000;

/// Held events of one producer, released in recorded-time order.
#[derive(Debug, Default)]
pub struct FollowUps {
    pending: Vec<(u64, Event)>,
    next_seq: u64,
    dropped: u64,
}

impl FollowUps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `event` until the clock reaches its recorded time.
    ///
    /// Returns false (and drops the event) when [`MAX_PENDING`] events are
    /// already held.
    pub fn schedule(&mut self, event: Event) -> bool {
        if self.pending.len() >= MAX_PENDING {
            self.dropped += 1;
            tracing::warn!(
                "Too many pending {} events, dropping {}",
                event.partition(),
                event.key()
            );
            return false;
        }
        self.pending.push((self.next_seq, event));
        self.next_seq += 1;
        true
    }

    /// Take every held event recorded at or before `at`.
    ///
    /// Events come back ordered by recorded time; ties keep scheduling order.
    pub fn release(&mut self, at: DateTime<Utc>) -> Vec<Event> {
        let (mut due, held): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|(_, event)| event.recorded_at() <= at);
        self.pending = held;

        due.sort_by_key(|(seq, event)| (event.recorded_at(), *seq));
        due.into_iter().map(|(_, event)| event).collect()
    }

    /// Recorded time of the earliest held event.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.pending.iter().map(|(_, e)| e.recorded_at()).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Events dropped because too many were held.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

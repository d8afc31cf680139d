//! The delivery queue between producers and the consumer.
//!
//! Producers never touch the queue directly. Each job holds a cloned
//! [`EventSender`] and sends events over an unbounded channel; the single
//! consumer owns the [`EventQueue`] (the receiving end) and drains it.
//! Channel order is append order, so `drain_all` returns events in the order
//! they were appended.

use datagen_core::Event;
use tokio::sync::mpsc;

/// Producer-side handle for appending events.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    /// Append one event.
    ///
    /// Never blocks. Returns `false` only once the queue has been closed by
    /// shutdown, in which case the event is dropped.
    pub fn append(&self, event: Event) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                tracing::debug!(
                    "Queue closed, dropping {} event {}",
                    event.partition(),
                    event.key()
                );
                false
            }
        }
    }

    /// Append events in order, returning how many were accepted.
    pub fn append_batch(&self, events: impl IntoIterator<Item = Event>) -> usize {
        let mut accepted = 0;
        for event in events {
            if !self.append(event) {
                break;
            }
            accepted += 1;
        }
        accepted
    }
}

/// Unbounded, insertion-ordered event queue with a single consumer.
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    closed: bool,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            closed: false,
        }
    }

    /// A new producer handle for this queue.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Remove and return every event currently queued, in append order.
    ///
    /// Never waits for new events; returns an empty vector when nothing is
    /// pending.
    pub fn drain_all(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Discard every pending event, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        self.drain_all().len()
    }

    /// Stop accepting appends. Already queued events stay until drained or
    /// cleared.
    pub fn close(&mut self) {
        self.rx.close();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use datagen_core::{EventSchema, FieldType, FieldValue};
    use std::sync::Arc;

    fn event(key: &str) -> Event {
        let schema = Arc::new(
            EventSchema::builder("test")
                .field("n", FieldType::String)
                .build(),
        );
        Event::new(
            "test",
            key,
            schema,
            vec![("n".to_string(), FieldValue::from(key))],
            Utc::now(),
        )
        .unwrap()
    }

    fn keys(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.key()).collect()
    }

    #[test]
    fn test_drain_in_append_order() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        assert!(sender.append(event("a")));
        assert_eq!(sender.append_batch(vec![event("b"), event("c")]), 2);

        let drained = queue.drain_all();
        assert_eq!(keys(&drained), ["a", "b", "c"]);
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_drains_partition_history() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();

        sender.append(event("1"));
        let first = queue.drain_all();
        sender.append(event("2"));
        sender.append(event("3"));
        let second = queue.drain_all();

        assert_eq!(keys(&first), ["1"]);
        assert_eq!(keys(&second), ["2", "3"]);
    }

    #[test]
    fn test_clear() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        sender.append_batch(vec![event("a"), event("b")]);
        assert_eq!(queue.clear(), 2);
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_closed_queue_rejects_appends() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        sender.append(event("before"));

        queue.close();
        assert!(queue.is_closed());
        assert!(!sender.append(event("after")));
        assert_eq!(sender.append_batch(vec![event("x"), event("y")]), 0);

        assert_eq!(keys(&queue.drain_all()), ["before"]);
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 500;

        let mut queue = EventQueue::new();
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let sender = queue.sender();
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        sender.append(event(&format!("{p}-{i}")));
                    }
                })
            })
            .collect();

        // Drain while producers are still running
        let mut drained = Vec::new();
        for _ in 0..10 {
            drained.extend(queue.drain_all());
            std::thread::yield_now();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        drained.extend(queue.drain_all());

        assert_eq!(drained.len(), PRODUCERS * PER_PRODUCER);
        let unique: std::collections::HashSet<&str> = drained.iter().map(|e| e.key()).collect();
        assert_eq!(unique.len(), drained.len());

        // Each producer's own events keep their relative order
        for p in 0..PRODUCERS {
            let prefix = format!("{p}-");
            let sequence: Vec<usize> = drained
                .iter()
                .filter_map(|e| e.key().strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(sequence, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }
}

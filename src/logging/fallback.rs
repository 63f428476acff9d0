//! In-process fallback tier.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::telemetry;
use crate::types::InteractionRecord;

/// Bounded buffer of records the durable store did not take.
///
/// When full, the oldest record makes room for the new one and the overflow
/// counter goes up.
pub struct FallbackLog {
    records: Mutex<VecDeque<InteractionRecord>>,
    capacity: usize,
    overflowed: AtomicU64,
}

impl FallbackLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            overflowed: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<InteractionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, record: InteractionRecord) {
        let mut records = self.lock();
        let evicted = if records.len() >= self.capacity {
            records.pop_front()
        } else {
            None
        };
        records.push_back(record);
        drop(records);

        metrics::counter!(telemetry::INTERACTIONS_LOGGED_TOTAL, "tier" => "fallback").increment(1);
        if let Some(old) = evicted {
            self.overflowed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(telemetry::FALLBACK_OVERFLOW_TOTAL).increment(1);
            warn!(record_id = %old.id, capacity = self.capacity, "fallback log full, discarded oldest record");
        }
    }

    /// Copy of the buffered records, oldest first.
    pub fn snapshot(&self) -> Vec<InteractionRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Remove and return every buffered record.
    pub fn drain(&self) -> Vec<InteractionRecord> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records discarded to make room since creation.
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }
}

use std::collections::VecDeque;

use crate::models::AlertRecord;

/// Records retained per session; the oldest are dropped beyond this
pub const ALERT_LOG_CAPACITY: usize = 100;

/// Bounded, insertion-ordered store of fired alerts. Insertion order is
/// timestamp order (cycles are processed sequentially); eviction removes
/// from the front and never reorders.
#[derive(Debug)]
pub struct AlertLog {
    records: VecDeque<AlertRecord>,
    capacity: usize,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, record: AlertRecord) {
        self.records.push_back(record);
        if self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Newest-to-oldest walk over the current contents. Re-invocable any
    /// number of times; never mutates.
    pub fn recent_first(&self) -> impl Iterator<Item = &AlertRecord> {
        self.records.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records (session reset)
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

//! Append-only audit ledger of resolution decisions.

use std::sync::{Mutex, PoisonError};

use crate::core::types::DecisionRecord;

/// Sink for resolution decisions.
///
/// Implementations must preserve insertion order and never drop or reorder
/// records appended by concurrent resolutions. No update or delete exists.
pub trait AuditLedger: Send + Sync {
    fn record(&self, record: DecisionRecord);

    /// Full history in insertion order.
    fn entries(&self) -> Vec<DecisionRecord>;
}

/// Process-local ledger; appends are serialized by a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: Mutex<Vec<DecisionRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent record, if any.
    pub fn last(&self) -> Option<DecisionRecord> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl AuditLedger for InMemoryLedger {
    fn record(&self, record: DecisionRecord) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    fn entries(&self) -> Vec<DecisionRecord> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

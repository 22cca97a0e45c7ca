//! Append-only journal of emitted ledger events.

use parking_lot::RwLock;

use chipvault_common::{AccountId, EventRecord, LedgerEvent};

/// In-memory record of every notification the ledger has emitted.
///
/// Events are appended exactly once per successful operation; aborted
/// operations leave no trace here.
#[derive(Debug, Default)]
pub struct EventLog {
    records: RwLock<Vec<EventRecord>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Append an event.
    pub fn record(&self, event: LedgerEvent) -> EventRecord {
        let record = EventRecord::new(event);
        self.records.write().push(record.clone());
        record
    }

    /// Snapshot of all records in emission order.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.records.read().clone()
    }

    /// Records involving the given account, in emission order.
    pub fn for_account(&self, account: &AccountId) -> Vec<EventRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.involves(account))
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

use ::model::Error;
use async_trait::async_trait;
use ledger::LedgerErrorReason::BackendFailure;
use ledger::{LedgerError, LedgerOperation, LedgerQuery, LedgerStore};
use model::{ActivityRecord, SortOrder, Timestamp};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type LedgerKey = (String, Timestamp);

/// Ledger held in process memory. Keys sort by user then timestamp,
/// mirroring a partition key with a numeric sort key.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    records: Arc<Mutex<BTreeMap<LedgerKey, ActivityRecord>>>,
}

impl InMemoryLedgerStore {
    /// Create a store already holding `records`.
    pub fn with_records(records: impl IntoIterator<Item = ActivityRecord>) -> Self {
        let records: BTreeMap<LedgerKey, ActivityRecord> = records
            .into_iter()
            .map(|record| ((record.user_id.clone(), record.timestamp), record))
            .collect();

        InMemoryLedgerStore {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// The record stored under `(user_id, timestamp)`, if any.
    pub fn get(&self, user_id: &str, timestamp: Timestamp) -> Option<ActivityRecord> {
        self.records
            .lock()
            .ok()?
            .get(&(user_id.to_string(), timestamp))
            .cloned()
    }

    /// Total number of records across all users.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
        key: &str,
        operation: LedgerOperation,
    ) -> Result<MutexGuard<'_, BTreeMap<LedgerKey, ActivityRecord>>, LedgerError> {
        self.records.lock().map_err(|err| {
            let cause: Error = err.to_string().into();

            LedgerError::new(key.to_string(), operation, BackendFailure(cause))
        })
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn query(&self, query: LedgerQuery) -> Result<Vec<ActivityRecord>, LedgerError> {
        let guard = self.lock(&query.user_id, LedgerOperation::Query)?;

        let start: LedgerKey = (query.user_id.clone(), Timestamp::MIN);
        let end: LedgerKey = (query.user_id.clone(), Timestamp::MAX);
        let partition = guard
            .range(start..=end)
            .map(|(_, record)| record)
            .filter(|record| query.matches(record));

        let limit: usize = query.limit.map_or(usize::MAX, |limit| limit as usize);

        let records: Vec<ActivityRecord> = match query.order {
            SortOrder::OldestFirst => partition.take(limit).cloned().collect(),
            SortOrder::NewestFirst => partition.rev().take(limit).cloned().collect(),
        };

        Ok(records)
    }

    async fn put(&self, record: ActivityRecord) -> Result<(), LedgerError> {
        self.lock(&record.user_id, LedgerOperation::Put)?
            .insert((record.user_id.clone(), record.timestamp), record);

        Ok(())
    }
}

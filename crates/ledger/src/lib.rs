use ::model::Error;
use async_trait::async_trait;
use model::{ActivityRecord, SortOrder, Timestamp};
use std::fmt::{Display, Formatter};

/// Append-only store of activity records, partitioned by user and
/// ordered by timestamp within a partition.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Records of a single user matching the query, in the requested order.
    /// Never returns more than `query.limit` records.
    async fn query(&self, query: LedgerQuery) -> Result<Vec<ActivityRecord>, LedgerError>;

    /// Write a record. An existing record with the same key is replaced.
    async fn put(&self, record: ActivityRecord) -> Result<(), LedgerError>;
}

/// A key condition over one user's partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerQuery {
    pub user_id: String,
    // Exclusive lower bound on the timestamp
    pub after: Option<Timestamp>,
    pub order: SortOrder,
    pub limit: Option<u32>,
}

impl LedgerQuery {
    /// Every record of the user, newest first.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        LedgerQuery {
            user_id: user_id.into(),
            after: None,
            order: SortOrder::NewestFirst,
            limit: None,
        }
    }

    pub fn after(mut self, timestamp: Timestamp) -> Self {
        self.after = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record satisfies the key condition, ignoring order and limit.
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        record.user_id == self.user_id && self.after.is_none_or(|after| record.timestamp > after)
    }
}

/// Errors arising from reading or writing the ledger.
#[derive(Debug)]
pub struct LedgerError {
    pub key: String,

    pub operation: LedgerOperation,
    pub reason: LedgerErrorReason,
}

#[derive(Debug)]
pub enum LedgerErrorReason {
    // A stored item couldn't be converted to or from a record
    BadRecord(String),
    // An error from the underlying store
    BackendFailure(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOperation {
    Query,
    Put,
}

impl LedgerError {
    pub fn new(key: String, operation: LedgerOperation, reason: LedgerErrorReason) -> Self {
        LedgerError {
            key,
            operation,
            reason,
        }
    }
}

impl Display for LedgerErrorReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerErrorReason::BadRecord(message) => write!(f, "bad record: {message}"),
            LedgerErrorReason::BackendFailure(err) => write!(f, "backend failure: {err}"),
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} [{}] failed, {}", self.operation, self.key, self.reason)
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.reason {
            LedgerErrorReason::BackendFailure(err) => Some(err.as_ref()),
            LedgerErrorReason::BadRecord(_) => None,
        }
    }
}

pub mod activity;
pub mod env;

pub use activity::{ActivityRecord, ActivityRequest, ActivityResponse, Status};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Seconds since the epoch, used as the ledger sort key.
pub type Timestamp = i64;

/// Direction in which records are returned from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    OldestFirst,
    #[default]
    NewestFirst,
}

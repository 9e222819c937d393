use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Phase of an activity. Only `START` carries meaning for elapsed time,
/// every other value is opaque to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub i64);

impl Status {
    /// Clock-in. Anchors the working time calculation.
    pub const START: Status = Status(1);
    /// Written in place of the request status by the scanning recorders.
    pub const CLOSING: Status = Status(4);

    pub fn is_start(&self) -> bool {
        *self == Status::START
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single immutable ledger entry, keyed by `(userID, timestamp)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub timestamp: Timestamp,
    pub status: Status,
}

impl ActivityRecord {
    pub fn new(user_id: impl Into<String>, timestamp: Timestamp, status: Status) -> Self {
        ActivityRecord {
            user_id: user_id.into(),
            timestamp,
            status,
        }
    }
}

/// Body of an inbound request. All three fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub timestamp: Timestamp,
    pub status: Status,
}

impl ActivityRequest {
    /// The ledger entry this request produces when written with `status`.
    pub fn to_record(&self, status: Status) -> ActivityRecord {
        ActivityRecord::new(self.user_id.clone(), self.timestamp, status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub working_time: i64,
}

/// Name of the DynamoDB table holding the ledger
pub const ACTIVITY_TABLE_NAME: &str = "ACTIVITY_TABLE_NAME";
/// Optional region override for the table, otherwise the SDK default chain applies
pub const ACTIVITY_TABLE_REGION: &str = "ACTIVITY_TABLE_REGION";
/// Use strongly consistent reads when querying the ledger
pub const ACTIVITY_CONSISTENT_READ: &str = "ACTIVITY_CONSISTENT_READ";

/// Base recorder configuration: `windowed-scan`, `capped-scan` or `latest-only`
pub const ACTIVITY_RECORDER_PRESET: &str = "ACTIVITY_RECORDER_PRESET";
/// Trailing query window in seconds, or `none`
pub const ACTIVITY_WINDOW_SECONDS: &str = "ACTIVITY_WINDOW_SECONDS";
/// Maximum number of prior records queried, or `none`
pub const ACTIVITY_QUERY_LIMIT: &str = "ACTIVITY_QUERY_LIMIT";
/// `first-match`, `last-match` or `most-recent`
pub const ACTIVITY_SELECTION_POLICY: &str = "ACTIVITY_SELECTION_POLICY";
/// `pass-through` or `sentinel:<status>`
pub const ACTIVITY_WRITE_STATUS: &str = "ACTIVITY_WRITE_STATUS";
/// Map malformed and precondition failures to 400 and 409 instead of 500
pub const ACTIVITY_DISTINCT_ERROR_CODES: &str = "ACTIVITY_DISTINCT_ERROR_CODES";

pub const DEFAULT_TABLE_NAME: &str = "userActivities";

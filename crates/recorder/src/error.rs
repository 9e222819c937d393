use ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// The request body didn't decode to a user, timestamp and status
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// Querying or writing the ledger failed
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] LedgerError),
    /// A prior record was required but none exists
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
}

impl RecorderError {
    /// HTTP status reported for this error. Every failure is a 500 unless
    /// `distinct` is set.
    pub fn status_code(&self, distinct: bool) -> i64 {
        match self {
            RecorderError::MalformedRequest(_) if distinct => 400,
            RecorderError::PreconditionFailed(_) if distinct => 409,
            _ => 500,
        }
    }
}

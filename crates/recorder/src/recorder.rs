use crate::config::RecorderConfig;
use crate::error::RecorderError;
use crate::selection::working_time;
use lambda_runtime::tracing;
use ledger::{LedgerQuery, LedgerStore};
use model::{ActivityRecord, ActivityRequest, ActivityResponse};
use std::sync::Arc;

/// Records activity events and reports the working time since the anchor.
pub struct ActivityRecorder {
    ledger: Arc<dyn LedgerStore>,
    config: RecorderConfig,
}

impl ActivityRecorder {
    pub fn new(ledger: Arc<dyn LedgerStore>, config: RecorderConfig) -> Self {
        ActivityRecorder { ledger, config }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Decode a raw JSON body and record it.
    pub async fn handle_body(&self, body: Option<&str>) -> Result<ActivityResponse, RecorderError> {
        let request: ActivityRequest = parse_request(body)?;

        self.record(request).await
    }

    /// Read the user's prior records, write the new one, then measure from
    /// the anchor. The write happens whatever the prior records hold, so a
    /// failed precondition still leaves the new record in the ledger.
    pub async fn record(&self, request: ActivityRequest) -> Result<ActivityResponse, RecorderError> {
        validate(&request)?;

        let query: LedgerQuery = self.config.query_for(&request);
        let prior: Vec<ActivityRecord> = self.ledger.query(query).await?;

        tracing::debug!(
            user_id = %request.user_id,
            prior_records = prior.len(),
            "Queried prior activity"
        );

        let record: ActivityRecord = request.to_record(self.config.write_status.status_for(&request));
        self.ledger.put(record).await?;

        let anchor: Option<&ActivityRecord> = self.config.selection.select_anchor(&prior)?;
        let working_time: i64 = working_time(request.timestamp, anchor);

        tracing::info!(
            user_id = %request.user_id,
            timestamp = request.timestamp,
            anchor = anchor.map(|a| a.timestamp),
            working_time,
            "Recorded activity"
        );

        Ok(ActivityResponse { working_time })
    }
}

/// Decode the request body.
pub fn parse_request(body: Option<&str>) -> Result<ActivityRequest, RecorderError> {
    let body: &str =
        body.ok_or_else(|| RecorderError::MalformedRequest("missing request body".to_string()))?;

    serde_json::from_str(body).map_err(|err| RecorderError::MalformedRequest(err.to_string()))
}

fn validate(request: &ActivityRequest) -> Result<(), RecorderError> {
    // DynamoDB rejects empty key attributes
    if request.user_id.is_empty() {
        return Err(RecorderError::MalformedRequest("userID must not be empty".to_string()));
    }

    Ok(())
}

use crate::config::SelectionPolicy;
use crate::error::RecorderError;
use model::{ActivityRecord, Timestamp};

impl SelectionPolicy {
    /// Pick the anchor from `records`, ordered newest first.
    ///
    /// `Ok(None)` means no record qualifies and the working time is zero.
    pub fn select_anchor<'a>(
        &self,
        records: &'a [ActivityRecord],
    ) -> Result<Option<&'a ActivityRecord>, RecorderError> {
        match self {
            SelectionPolicy::FirstMatch => Ok(records.iter().find(|r| r.status.is_start())),
            // Each later start replaces the one before, so the oldest wins
            SelectionPolicy::LastMatch => Ok(records
                .iter()
                .fold(None, |anchor, r| if r.status.is_start() { Some(r) } else { anchor })),
            SelectionPolicy::MostRecent => records.first().map(Some).ok_or_else(|| {
                RecorderError::PreconditionFailed("no prior activity for user".to_string())
            }),
        }
    }
}

/// Seconds between the anchor and `now`, or zero without an anchor.
pub fn working_time(now: Timestamp, anchor: Option<&ActivityRecord>) -> i64 {
    anchor.map_or(0, |anchor| now.saturating_sub(anchor.timestamp))
}

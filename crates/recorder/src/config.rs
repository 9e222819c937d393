use ledger::LedgerQuery;
use model::env::{
    ACTIVITY_DISTINCT_ERROR_CODES, ACTIVITY_QUERY_LIMIT, ACTIVITY_RECORDER_PRESET,
    ACTIVITY_SELECTION_POLICY, ACTIVITY_WINDOW_SECONDS, ACTIVITY_WRITE_STATUS,
};
use model::{ActivityRequest, Status};
use std::num::NonZeroU32;
use std::str::FromStr;

/// Trailing window applied by the windowed scan
pub const DEFAULT_WINDOW_SECONDS: i64 = 86_400;
/// Number of prior records read by the capped scan
pub const DEFAULT_QUERY_CAP: u32 = 50;

const NONE: &str = "none";

/// How the anchor is chosen from the prior records, which arrive newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// The newest record with a start status.
    FirstMatch,
    /// The oldest record with a start status in the queried window.
    LastMatch,
    /// The newest record regardless of status. Requires at least one record.
    MostRecent,
}

/// Status written for the new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatusPolicy {
    PassThrough,
    Sentinel(Status),
}

impl WriteStatusPolicy {
    pub fn status_for(&self, request: &ActivityRequest) -> Status {
        match self {
            WriteStatusPolicy::PassThrough => request.status,
            WriteStatusPolicy::Sentinel(status) => *status,
        }
    }
}

/// Named starting points for `RecorderConfig::from_env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    WindowedScan,
    CappedScan,
    LatestOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Only records newer than `request.timestamp - window_seconds` are read
    pub window_seconds: Option<i64>,
    /// Cap on the number of prior records read
    pub query_limit: Option<u32>,
    pub selection: SelectionPolicy,
    pub write_status: WriteStatusPolicy,
    /// Report malformed requests as 400 and failed preconditions as 409
    pub distinct_error_codes: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig::windowed_scan()
    }
}

impl From<Preset> for RecorderConfig {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::WindowedScan => RecorderConfig::windowed_scan(),
            Preset::CappedScan => RecorderConfig::capped_scan(),
            Preset::LatestOnly => RecorderConfig::latest_only(),
        }
    }
}

impl RecorderConfig {
    /// Scan the last day for the newest clock-in and write the closing status.
    pub fn windowed_scan() -> Self {
        RecorderConfig {
            window_seconds: Some(DEFAULT_WINDOW_SECONDS),
            query_limit: None,
            selection: SelectionPolicy::FirstMatch,
            write_status: WriteStatusPolicy::Sentinel(Status::CLOSING),
            distinct_error_codes: false,
        }
    }

    /// Scan the last 50 records, keeping the oldest clock-in among them.
    pub fn capped_scan() -> Self {
        RecorderConfig {
            window_seconds: None,
            query_limit: Some(DEFAULT_QUERY_CAP),
            selection: SelectionPolicy::LastMatch,
            write_status: WriteStatusPolicy::Sentinel(Status::CLOSING),
            distinct_error_codes: false,
        }
    }

    /// Measure from the single most recent record and store the request as sent.
    pub fn latest_only() -> Self {
        RecorderConfig {
            window_seconds: None,
            query_limit: Some(1),
            selection: SelectionPolicy::MostRecent,
            write_status: WriteStatusPolicy::PassThrough,
            distinct_error_codes: false,
        }
    }

    /// The ledger query reading the prior records for `request`.
    pub fn query_for(&self, request: &ActivityRequest) -> LedgerQuery {
        let mut query: LedgerQuery = LedgerQuery::for_user(request.user_id.clone());

        if let Some(window) = self.window_seconds {
            query = query.after(request.timestamp.saturating_sub(window));
        }
        if let Some(limit) = self.query_limit {
            query = query.limit(limit);
        }

        query
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration from `lookup`, starting from the named preset
    /// and applying any individual overrides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let preset: Preset = parse_var(&lookup, ACTIVITY_RECORDER_PRESET)?.unwrap_or_default();
        let mut config: RecorderConfig = preset.into();

        // Both must be positive, zero or negative would hide every prior record
        let window: Option<Optional<NonZeroU32>> = parse_var(&lookup, ACTIVITY_WINDOW_SECONDS)?;
        if let Some(window) = window {
            config.window_seconds = window.0.map(|window| i64::from(window.get()));
        }
        let limit: Option<Optional<NonZeroU32>> = parse_var(&lookup, ACTIVITY_QUERY_LIMIT)?;
        if let Some(limit) = limit {
            config.query_limit = limit.0.map(NonZeroU32::get);
        }
        if let Some(selection) = parse_var(&lookup, ACTIVITY_SELECTION_POLICY)? {
            config.selection = selection;
        }
        if let Some(write_status) = parse_var(&lookup, ACTIVITY_WRITE_STATUS)? {
            config.write_status = write_status;
        }
        if let Some(distinct) = parse_var(&lookup, ACTIVITY_DISTINCT_ERROR_CODES)? {
            config.distinct_error_codes = distinct;
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {variable}")]
    InvalidValue {
        variable: &'static str,
        value: String,
    },
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(variable) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { variable, value }),
    }
}

/// A value which may be switched off with `none`.
struct Optional<T>(Option<T>);

impl<T: FromStr> FromStr for Optional<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(NONE) {
            return Ok(Optional(None));
        }

        s.parse().map(|value| Optional(Some(value)))
    }
}

impl FromStr for Preset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windowed-scan" => Ok(Preset::WindowedScan),
            "capped-scan" => Ok(Preset::CappedScan),
            "latest-only" => Ok(Preset::LatestOnly),
            _ => Err(()),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-match" => Ok(SelectionPolicy::FirstMatch),
            "last-match" => Ok(SelectionPolicy::LastMatch),
            "most-recent" => Ok(SelectionPolicy::MostRecent),
            _ => Err(()),
        }
    }
}

impl FromStr for WriteStatusPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "pass-through" {
            return Ok(WriteStatusPolicy::PassThrough);
        }

        s.strip_prefix("sentinel:")
            .and_then(|status| status.trim().parse::<i64>().ok())
            .map(|status| WriteStatusPolicy::Sentinel(Status(status)))
            .ok_or(())
    }
}

use model::env::{
    ACTIVITY_CONSISTENT_READ, ACTIVITY_TABLE_NAME, ACTIVITY_TABLE_REGION, DEFAULT_TABLE_NAME,
};

/// Where the ledger table lives and how it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub table_name: String,
    /// Overrides the region from the default provider chain
    pub region: Option<String>,
    pub consistent_read: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            region: None,
            consistent_read: false,
        }
    }
}

impl StoreConfig {
    /// Read the store settings from the process environment.
    pub fn from_env() -> Result<Self, StoreConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the store settings from `lookup`. Blank values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreConfigError> {
        let set = |variable: &str| {
            lookup(variable)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config: StoreConfig = StoreConfig::default();

        if let Some(table_name) = set(ACTIVITY_TABLE_NAME) {
            config.table_name = table_name;
        }
        config.region = set(ACTIVITY_TABLE_REGION);
        if let Some(value) = set(ACTIVITY_CONSISTENT_READ) {
            config.consistent_read = value.parse().map_err(|_| StoreConfigError::InvalidValue {
                variable: ACTIVITY_CONSISTENT_READ,
                value,
            })?;
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreConfigError {
    #[error("invalid value {value:?} for {variable}")]
    InvalidValue {
        variable: &'static str,
        value: String,
    },
}

#![forbid(unsafe_code)]

use crate::{RetryPolicy, StoreError};
use folio_core::ValidationError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DB_FILE: &str = "folio.db";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);
/// SQLite takes the busy timeout as an `int` of milliseconds.
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

pub const ENV_DB_FILE: &str = "FOLIO_DB_FILE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "FOLIO_BUSY_TIMEOUT_MS";
pub const ENV_RETRY_MAX: &str = "FOLIO_RETRY_MAX";
pub const ENV_RETRY_UNIT_MS: &str = "FOLIO_RETRY_UNIT_MS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_dir: PathBuf,
    pub db_file: String,
    /// How long SQLite itself waits on a lock before reporting contention.
    pub busy_timeout: Duration,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: storage_dir.as_ref().to_path_buf(),
            db_file: DEFAULT_DB_FILE.to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Values above [`MAX_BUSY_TIMEOUT`] are clamped to it.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout.min(MAX_BUSY_TIMEOUT);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(&self.db_file)
    }

    /// Defaults overlaid with the `FOLIO_*` environment variables.
    pub fn from_env(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_lookup(storage_dir, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        storage_dir: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        let mut config = Self::new(storage_dir);

        if let Some(raw) = lookup(ENV_DB_FILE) {
            let file = raw.trim();
            if file.is_empty() || file.contains(['/', '\\']) {
                return Err(ValidationError::new(ENV_DB_FILE, "must be a plain file name").into());
            }
            config.db_file = file.to_string();
        }
        if let Some(ms) = parse_number(&lookup, ENV_BUSY_TIMEOUT_MS)? {
            let busy_timeout = Duration::from_millis(ms);
            if busy_timeout > MAX_BUSY_TIMEOUT {
                return Err(ValidationError::new(
                    ENV_BUSY_TIMEOUT_MS,
                    format!("must be at most {}", MAX_BUSY_TIMEOUT.as_millis()),
                )
                .into());
            }
            config.busy_timeout = busy_timeout;
        }

        let max_retries = match parse_number(&lookup, ENV_RETRY_MAX)? {
            Some(value) => u32::try_from(value)
                .map_err(|_| ValidationError::new(ENV_RETRY_MAX, "is too large"))?,
            None => config.retry.max_retries(),
        };
        let unit = parse_number(&lookup, ENV_RETRY_UNIT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(config.retry.unit());
        config.retry = RetryPolicy::new(max_retries, unit);

        Ok(config)
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, StoreError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| ValidationError::new(key, "must be a non-negative integer").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = StoreConfig::from_lookup("/tmp/folio", lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::new("/tmp/folio"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/folio/folio.db"));
        assert_eq!(config.retry.max_retries(), 3);
        assert_eq!(config.retry.unit(), Duration::from_millis(50));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = StoreConfig::from_lookup(
            "/tmp/folio",
            lookup(&[
                (ENV_DB_FILE, "custom.db"),
                (ENV_BUSY_TIMEOUT_MS, "250"),
                (ENV_RETRY_MAX, "7"),
                (ENV_RETRY_UNIT_MS, "5"),
            ]),
        )
        .unwrap();
        assert_eq!(config.db_file, "custom.db");
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.retry, RetryPolicy::new(7, Duration::from_millis(5)));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = StoreConfig::from_lookup("/tmp/folio", lookup(&[(ENV_RETRY_MAX, "-1")]))
            .unwrap_err();
        match err {
            StoreError::Validation(err) => assert_eq!(err.field, ENV_RETRY_MAX),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = StoreConfig::from_lookup("/tmp/folio", lookup(&[(ENV_DB_FILE, "../x.db")]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = StoreConfig::from_lookup(
            "/tmp/folio",
            lookup(&[(ENV_BUSY_TIMEOUT_MS, "3000000000")]),
        )
        .unwrap_err();
        match err {
            StoreError::Validation(err) => assert_eq!(err.field, ENV_BUSY_TIMEOUT_MS),
            other => panic!("expected validation error, got {other:?}"),
        }

        let edge = StoreConfig::from_lookup(
            "/tmp/folio",
            lookup(&[(ENV_BUSY_TIMEOUT_MS, "2147483647")]),
        )
        .unwrap();
        assert_eq!(edge.busy_timeout, MAX_BUSY_TIMEOUT);
    }

    #[test]
    fn builder_clamps_oversized_busy_timeout() {
        let config = StoreConfig::new("/tmp/folio").with_busy_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(config.busy_timeout, MAX_BUSY_TIMEOUT);
    }
}

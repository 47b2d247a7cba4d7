//! Runtime settings
//!
//! Settings are layered, lowest precedence first:
//! built-in defaults, an optional YAML file, environment variables
//! (a `.env` file is honoured), then CLI overrides applied by the runner.

use crate::collector::{CollectorConfig, FailurePolicy};
use crate::error::{Error, Result};
use crate::types::{StatusFilter, FINISHED_STATUS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Default API host of the reference deployment
pub const DEFAULT_BASE_URL: &str = "https://video.bunnycdn.com";

/// Prefix for environment variables read by [`Settings::apply_env`]
pub const ENV_PREFIX: &str = "PAGESWEEP_";

/// Settings for one collection run
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API host
    pub base_url: String,

    /// Remote collection (video library) identifier
    pub library_id: String,

    /// Access credential sent with every request
    pub access_key: String,

    /// Items per page for the worker fetches
    pub page_size: u32,

    /// Items per page for the initial probe
    pub probe_page_size: u32,

    /// Number of concurrent workers
    pub workers: usize,

    /// Items with this status are left out of the result
    pub excluded_status: i64,

    /// Sort key passed to the listing endpoint
    pub order_by: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Abort the whole run on the first failed page
    pub fail_fast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            library_id: String::new(),
            access_key: String::new(),
            page_size: 100,
            probe_page_size: 1,
            workers: 5,
            excluded_status: FINISHED_STATUS,
            order_by: "date".to_string(),
            timeout_secs: 30,
            fail_fast: false,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("library_id", &self.library_id)
            .field("access_key", &"***")
            .field("page_size", &self.page_size)
            .field("probe_page_size", &self.probe_page_size)
            .field("workers", &self.workers)
            .field("excluded_status", &self.excluded_status)
            .field("order_by", &self.order_by)
            .field("timeout_secs", &self.timeout_secs)
            .field("fail_fast", &self.fail_fast)
            .finish()
    }
}

impl Settings {
    /// Load settings from defaults, an optional YAML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };

        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse settings from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Overlay values found through `lookup`
    ///
    /// `PAGESWEEP_*` names win over the bare `LIBRARYID` / `ACCESSKEY` names.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = var("LIBRARY_ID").or_else(|| lookup("LIBRARYID")) {
            self.library_id = v;
        }
        if let Some(v) = var("ACCESS_KEY").or_else(|| lookup("ACCESSKEY")) {
            self.access_key = v;
        }
        if let Some(v) = var("PAGE_SIZE") {
            self.page_size = parse_var("PAGE_SIZE", &v)?;
        }
        if let Some(v) = var("PROBE_PAGE_SIZE") {
            self.probe_page_size = parse_var("PROBE_PAGE_SIZE", &v)?;
        }
        if let Some(v) = var("WORKERS") {
            self.workers = parse_var("WORKERS", &v)?;
        }
        if let Some(v) = var("EXCLUDED_STATUS") {
            self.excluded_status = parse_var("EXCLUDED_STATUS", &v)?;
        }
        if let Some(v) = var("ORDER_BY") {
            self.order_by = v;
        }
        if let Some(v) = var("TIMEOUT_SECS") {
            self.timeout_secs = parse_var("TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("FAIL_FAST") {
            self.fail_fast = parse_bool("FAIL_FAST", &v)?;
        }
        Ok(())
    }

    /// Check that a run can start with these settings
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        if self.library_id.trim().is_empty() {
            return Err(Error::missing_field("library_id"));
        }
        if self.access_key.trim().is_empty() {
            return Err(Error::missing_field("access_key"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.probe_page_size == 0 {
            return Err(Error::invalid_value("probe_page_size", "must be at least 1"));
        }
        if self.workers == 0 {
            return Err(Error::invalid_value("workers", "must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be at least 1"));
        }
        Ok(())
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Collector configuration derived from these settings
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig::new()
            .with_workers(self.workers)
            .with_page_size(self.page_size)
            .with_probe_page_size(self.probe_page_size)
            .with_filter(StatusFilter::excluding(self.excluded_status))
            .with_failure_policy(if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Isolate
            })
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| Error::invalid_value(format!("{ENV_PREFIX}{name}"), e.to_string()))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::invalid_value(
            format!("{ENV_PREFIX}{name}"),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn valid() -> Settings {
        Settings {
            library_id: "12345".to_string(),
            access_key: "key".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.probe_page_size, 1);
        assert_eq!(settings.workers, 5);
        assert_eq!(settings.excluded_status, FINISHED_STATUS);
        assert_eq!(settings.order_by, "date");
        assert!(!settings.fail_fast);
    }

    #[test]
    fn test_yaml_partial_keeps_defaults() {
        let settings = Settings::from_yaml_str(
            r"
library_id: lib-1
access_key: secret
workers: 12
",
        )
        .unwrap();

        assert_eq!(settings.library_id, "lib-1");
        assert_eq!(settings.workers, 12);
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "library_id: from-file\npage_size: 50").unwrap();

        let settings = Settings::from_yaml_file(file.path()).unwrap();
        assert_eq!(settings.library_id, "from-file");
        assert_eq!(settings.page_size, 50);
    }

    #[test]
    fn test_yaml_file_missing() {
        let err = Settings::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_yaml_invalid() {
        let err = Settings::from_yaml_str("workers: [1, 2]").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_env_legacy_names() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[("LIBRARYID", "777"), ("ACCESSKEY", "k")]))
            .unwrap();

        assert_eq!(settings.library_id, "777");
        assert_eq!(settings.access_key, "k");
    }

    #[test]
    fn test_env_prefixed_names_win() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[
                ("LIBRARYID", "legacy"),
                ("PAGESWEEP_LIBRARY_ID", "prefixed"),
                ("PAGESWEEP_WORKERS", "9"),
                ("PAGESWEEP_PAGE_SIZE", "25"),
                ("PAGESWEEP_EXCLUDED_STATUS", "5"),
                ("PAGESWEEP_FAIL_FAST", "yes"),
                ("PAGESWEEP_BASE_URL", "http://localhost:1234"),
            ]))
            .unwrap();

        assert_eq!(settings.library_id, "prefixed");
        assert_eq!(settings.workers, 9);
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.excluded_status, 5);
        assert!(settings.fail_fast);
        assert_eq!(settings.base_url, "http://localhost:1234");
    }

    #[test]
    fn test_env_bad_number() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("PAGESWEEP_WORKERS", "many")]))
            .unwrap_err();

        assert!(err.is_config());
        assert!(err.to_string().contains("PAGESWEEP_WORKERS"));
    }

    #[test]
    fn test_env_bad_bool() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("PAGESWEEP_FAIL_FAST", "maybe")]))
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_credentials() {
        let settings = Settings {
            access_key: String::new(),
            ..valid()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::MissingConfigField { field }) if field == "access_key"
        ));

        let settings = Settings {
            library_id: "  ".to_string(),
            ..valid()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::MissingConfigField { field }) if field == "library_id"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        for settings in [
            Settings { page_size: 0, ..valid() },
            Settings { probe_page_size: 0, ..valid() },
            Settings { workers: 0, ..valid() },
            Settings { timeout_secs: 0, ..valid() },
        ] {
            let err = settings.validate().unwrap_err();
            assert!(matches!(err, Error::InvalidConfigValue { .. }), "{err}");
        }
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let settings = Settings {
            base_url: "not a url".to_string(),
            ..valid()
        };
        assert!(settings.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_debug_hides_access_key() {
        let debug = format!("{:?}", valid());
        assert!(!debug.contains("\"key\""));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_collector_config() {
        let settings = Settings {
            workers: 3,
            page_size: 40,
            probe_page_size: 2,
            excluded_status: 6,
            fail_fast: true,
            ..valid()
        };

        let config = settings.collector_config();
        assert_eq!(config.workers, 3);
        assert_eq!(config.page_size, 40);
        assert_eq!(config.probe_page_size, 2);
        assert_eq!(config.filter, StatusFilter::excluding(6));
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
    }
}

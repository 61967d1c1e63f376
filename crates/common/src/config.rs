//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PREFERENCES_PATH: &str = "dashboard_prefs.json";
pub const DEFAULT_USER: &str = "admin";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be true or false, got {value:?}")]
    InvalidBool { key: &'static str, value: String },
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: Url,
    /// `None` keeps the HTTP client's default behaviour.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub backend: BackendSettings,
    pub poll_interval: Duration,
    pub stop_tracking_on_deactivate: bool,
    pub preferences_path: PathBuf,
    pub username: String,
    pub password_sha256: String,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = get("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let base_url = Url::parse(raw_url.trim()).map_err(|source| ConfigError::InvalidUrl {
            key: "BACKEND_URL",
            source,
        })?;

        let poll_interval = match get("POLL_INTERVAL_SECS") {
            Some(v) => Duration::from_secs(parse_secs("POLL_INTERVAL_SECS", &v)?),
            None => DEFAULT_POLL_INTERVAL,
        };

        let request_timeout = get("REQUEST_TIMEOUT_SECS")
            .map(|v| parse_secs("REQUEST_TIMEOUT_SECS", &v).map(Duration::from_secs))
            .transpose()?;

        let stop_tracking_on_deactivate = match get("STOP_TRACKING_ON_DEACTIVATE") {
            Some(v) => parse_bool("STOP_TRACKING_ON_DEACTIVATE", &v)?,
            None => false,
        };

        let password_sha256 = get("DASHBOARD_PASSWORD_SHA256")
            .map(|v| v.trim().to_lowercase())
            .ok_or(ConfigError::Missing("DASHBOARD_PASSWORD_SHA256"))?;

        Ok(Self {
            backend: BackendSettings {
                base_url,
                request_timeout,
            },
            poll_interval,
            stop_tracking_on_deactivate,
            preferences_path: get("PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_PATH)),
            username: get("DASHBOARD_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            password_sha256,
        })
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DIGEST: &str = "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config =
            DashboardConfig::from_lookup(lookup(&[("DASHBOARD_PASSWORD_SHA256", DIGEST)])).unwrap();

        assert_eq!(config.backend.base_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.backend.request_timeout, None);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert!(!config.stop_tracking_on_deactivate);
        assert_eq!(config.username, "admin");
        assert_eq!(config.password_sha256, DIGEST.to_lowercase());
    }

    #[test]
    fn reads_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "https://signals.example.com/api"),
            ("POLL_INTERVAL_SECS", "5"),
            ("REQUEST_TIMEOUT_SECS", "12"),
            ("STOP_TRACKING_ON_DEACTIVATE", "yes"),
            ("PREFERENCES_PATH", "/tmp/prefs.json"),
            ("DASHBOARD_USER", "ops"),
            ("DASHBOARD_PASSWORD_SHA256", DIGEST),
        ]))
        .unwrap();

        assert_eq!(config.backend.base_url.path(), "/api");
        assert_eq!(config.backend.request_timeout, Some(Duration::from_secs(12)));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(config.stop_tracking_on_deactivate);
        assert_eq!(config.preferences_path, PathBuf::from("/tmp/prefs.json"));
        assert_eq!(config.username, "ops");
    }

    #[test]
    fn rejects_malformed_values() {
        let err = DashboardConfig::from_lookup(lookup(&[
            ("POLL_INTERVAL_SECS", "0"),
            ("DASHBOARD_PASSWORD_SHA256", DIGEST),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "POLL_INTERVAL_SECS", .. }));

        let err = DashboardConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "not a url"),
            ("DASHBOARD_PASSWORD_SHA256", DIGEST),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = DashboardConfig::from_lookup(lookup(&[
            ("STOP_TRACKING_ON_DEACTIVATE", "maybe"),
            ("DASHBOARD_PASSWORD_SHA256", DIGEST),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }

    #[test]
    fn password_digest_is_required() {
        let err = DashboardConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DASHBOARD_PASSWORD_SHA256")));
    }
}

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

fn env_duration_millis(key: &str, default_millis: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_millis))
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Default maximum age of a cached count (two hours).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Runtime configuration for the waitlist client.
#[derive(Debug, Clone)]
pub struct WaitlistConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub store_path: PathBuf,
    pub count_key: String,
    pub joined_key: String,
    /// Re-fetch the authoritative count after a successful join instead of
    /// incrementing locally.
    pub refresh_after_join: bool,
}

impl WaitlistConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string("WAITLIST_API_URL", "http://localhost:3000"),
            cache_ttl: env_duration_secs("WAITLIST_CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs()),
            request_timeout: env_duration_millis("WAITLIST_REQUEST_TIMEOUT_MS", 10_000),
            store_path: PathBuf::from(env_string(
                "WAITLIST_STORE_PATH",
                "./.waitlist/store.json",
            )),
            count_key: env_string("WAITLIST_COUNT_KEY", "waitlist_count"),
            joined_key: env_string("WAITLIST_JOINED_KEY", "waitlist_joined"),
            refresh_after_join: env_bool("WAITLIST_REFRESH_AFTER_JOIN", false),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("WAITLIST_API_URL must not be empty".into()));
        }
        if self.cache_ttl.is_zero() {
            return Err(ConfigError::Invalid(
                "WAITLIST_CACHE_TTL_SECS must be greater than zero".into(),
            ));
        }
        if self.count_key == self.joined_key {
            return Err(ConfigError::Invalid(
                "count and joined storage keys must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn count_url(&self) -> String {
        format!("{}/api/waitlist/count", self.base_url.trim_end_matches('/'))
    }

    pub fn join_url(&self) -> String {
        format!("{}/api/waitlist/join", self.base_url.trim_end_matches('/'))
    }
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: Duration::from_millis(10_000),
            store_path: PathBuf::from("./.waitlist/store.json"),
            count_key: "waitlist_count".to_string(),
            joined_key: "waitlist_joined".to_string(),
            refresh_after_join: false,
        }
    }
}

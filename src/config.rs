use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Threads Graph API
    pub api_base: String,
    pub access_token: String,
    pub http_timeout: Duration,

    // Fetching
    pub page_size: u32,
    pub resolver_concurrency: usize,

    // Output
    pub output_dir: PathBuf,
    pub pages_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable has an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Threads Graph API
            api_base: env_or_default("THREADS_API_BASE", "https://graph.threads.net/v1.0"),
            access_token: std::env::var("THREADS_TOKEN").unwrap_or_default(),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),

            // Fetching
            page_size: parse_env_u32("PAGE_SIZE", 100)?,
            resolver_concurrency: parse_env_usize("RESOLVER_CONCURRENCY", 8)?,

            // Output
            output_dir: PathBuf::from(env_or_default("OUTPUT_DIR", "dist/posts")),
            pages_dir: PathBuf::from(env_or_default("PAGES_DIR", "dist/pages")),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.api_base).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "THREADS_API_BASE".to_string(),
                message: format!("not a valid URL: {}", self.api_base),
            });
        }
        if self.page_size == 0 || self.page_size > 100 {
            return Err(ConfigError::InvalidValue {
                name: "PAGE_SIZE".to_string(),
                message: "must be between 1 and 100".to_string(),
            });
        }
        if self.resolver_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RESOLVER_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Baseline configuration for tests; override fields as needed.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            api_base: "http://127.0.0.1:1".to_string(),
            access_token: "test-token".to_string(),
            http_timeout: Duration::from_secs(10),
            page_size: 100,
            resolver_concurrency: 4,
            output_dir: PathBuf::from("./dist/posts"),
            pages_dir: PathBuf::from("./dist/pages"),
        }
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_defaults() {
        assert_eq!(parse_env_u64("NONEXISTENT_VAR", 30).unwrap(), 30);
        assert_eq!(parse_env_u32("NONEXISTENT_VAR", 100).unwrap(), 100);
        assert_eq!(parse_env_usize("NONEXISTENT_VAR", 8).unwrap(), 8);
    }

    #[test]
    fn test_validate_page_size() {
        let mut config = Config::for_testing();
        config.page_size = 0;
        assert!(config.validate().is_err());
        config.page_size = 101;
        assert!(config.validate().is_err());
        config.page_size = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_api_base() {
        let mut config = Config::for_testing();
        config.api_base = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_resolver_concurrency() {
        let mut config = Config::for_testing();
        config.resolver_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_overrides() {
        std::env::set_var("THREADS_API_BASE", "https://example.test/v1.0");
        std::env::set_var("PAGE_SIZE", "25");
        let config = Config::from_env().expect("Failed to load config");
        assert_eq!(config.api_base, "https://example.test/v1.0");
        assert_eq!(config.page_size, 25);
        std::env::remove_var("THREADS_API_BASE");
        std::env::remove_var("PAGE_SIZE");
    }
}

//! Broadcast session configuration.
//!
//! Loaded from environment variables. Only the credential service URL is
//! required; everything else has a default.

use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default public origin used to build share links.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4200";

/// Default meeting title when the host leaves it blank.
pub const DEFAULT_TITLE: &str = "Live Broadcast";

/// Default delay between a recomputation and the render push.
pub const DEFAULT_RENDER_DELAY_MS: u64 = 100;

/// Default credential service request timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Default controller mailbox capacity.
pub const DEFAULT_MAILBOX_SIZE: usize = 64;

/// Broadcast session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Credential service base URL (`BROADCAST_API_URL`).
    pub api_url: String,

    /// Public origin of the web app, used for viewer share links
    /// (`BROADCAST_PUBLIC_BASE_URL`, default "http://localhost:4200").
    pub public_base_url: String,

    /// Title used when the host supplies none (`BROADCAST_DEFAULT_TITLE`).
    pub default_title: String,

    /// Render push delay (`BROADCAST_RENDER_DELAY_MS`, default 100).
    pub render_delay: Duration,

    /// Credential service request timeout (`BROADCAST_HTTP_TIMEOUT_SECONDS`).
    pub http_timeout: Duration,

    /// Controller mailbox capacity (`BROADCAST_MAILBOX_SIZE`).
    pub mailbox_size: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map of variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `BROADCAST_API_URL` is unset,
    /// and `ConfigError::InvalidValue` for malformed URLs or numbers.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_url = vars
            .get("BROADCAST_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("BROADCAST_API_URL".to_string()))?
            .clone();
        parse_http_url("BROADCAST_API_URL", &api_url)?;

        let public_base_url = vars
            .get("BROADCAST_PUBLIC_BASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string());
        parse_http_url("BROADCAST_PUBLIC_BASE_URL", &public_base_url)?;

        let default_title = vars
            .get("BROADCAST_DEFAULT_TITLE")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let render_delay_ms =
            parse_number(vars, "BROADCAST_RENDER_DELAY_MS", DEFAULT_RENDER_DELAY_MS)?;

        let http_timeout_seconds = parse_number(
            vars,
            "BROADCAST_HTTP_TIMEOUT_SECONDS",
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;
        if http_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "BROADCAST_HTTP_TIMEOUT_SECONDS must be greater than zero".to_string(),
            ));
        }

        let mailbox_size = parse_number(vars, "BROADCAST_MAILBOX_SIZE", DEFAULT_MAILBOX_SIZE)?;
        // mpsc::channel panics on a zero capacity
        if mailbox_size == 0 {
            return Err(ConfigError::InvalidValue(
                "BROADCAST_MAILBOX_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            api_url,
            public_base_url,
            default_title,
            render_delay: Duration::from_millis(render_delay_ms),
            http_timeout: Duration::from_secs(http_timeout_seconds),
            mailbox_size,
        })
    }
}

fn parse_http_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidValue(format!("{name} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue(format!(
            "{name} must use http or https, got {other}"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{name} must be a number, got {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "BROADCAST_API_URL".to_string(),
            "http://localhost:8787".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(config.api_url, "http://localhost:8787");
        assert_eq!(config.public_base_url, DEFAULT_PUBLIC_BASE_URL);
        assert_eq!(config.default_title, "Live Broadcast");
        assert_eq!(config.render_delay, Duration::from_millis(100));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.mailbox_size, 64);
    }

    #[test]
    fn test_from_vars_overrides() {
        let mut vars = base_vars();
        vars.insert(
            "BROADCAST_PUBLIC_BASE_URL".to_string(),
            "https://live.example.com".to_string(),
        );
        vars.insert("BROADCAST_DEFAULT_TITLE".to_string(), "Town Hall".to_string());
        vars.insert("BROADCAST_RENDER_DELAY_MS".to_string(), "0".to_string());
        vars.insert("BROADCAST_HTTP_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert("BROADCAST_MAILBOX_SIZE".to_string(), "8".to_string());

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.public_base_url, "https://live.example.com");
        assert_eq!(config.default_title, "Town Hall");
        assert_eq!(config.render_delay, Duration::ZERO);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.mailbox_size, 8);
    }

    #[test]
    fn test_missing_api_url() {
        let result = Config::from_vars(&HashMap::new());
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref name)) if name == "BROADCAST_API_URL")
        );
    }

    #[test]
    fn test_blank_title_uses_default() {
        let mut vars = base_vars();
        vars.insert("BROADCAST_DEFAULT_TITLE".to_string(), "   ".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.default_title, DEFAULT_TITLE);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            ("BROADCAST_API_URL", "not a url"),
            ("BROADCAST_API_URL", "ftp://files.local"),
            ("BROADCAST_PUBLIC_BASE_URL", "localhost"),
            ("BROADCAST_RENDER_DELAY_MS", "soon"),
            ("BROADCAST_HTTP_TIMEOUT_SECONDS", "0"),
            ("BROADCAST_MAILBOX_SIZE", "0"),
            ("BROADCAST_MAILBOX_SIZE", "-1"),
        ];

        for (name, value) in cases {
            let mut vars = base_vars();
            vars.insert(name.to_string(), value.to_string());
            let result = Config::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(_))),
                "{name}={value} should be rejected"
            );
        }
    }
}

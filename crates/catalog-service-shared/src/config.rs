//! Service configuration read from environment variables.
//!
//! [`ServiceConfig::from_env`] is the production entry point;
//! [`ServiceConfig::from_lookup`] takes any key lookup so tests can feed a
//! fixed map instead of mutating the process environment.
//!
//! # Environment Variables
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `3000` |
//! | `HTTPS_PORT` | `3443` |
//! | `APP_ENV` | `development` |
//! | `ENABLE_HTTPS` | `false` |
//! | `SSL_CERT_PATH` / `SSL_KEY_PATH` | `certs/server.crt` / `certs/server.key` |
//! | `CORS_ALLOWED_ORIGINS` | local development origins |
//! | `RATE_LIMIT_ENABLED` | `true` |
//! | `RATE_LIMIT_WINDOW_SECS` | `900` |
//! | `RATE_LIMIT_MAX` | `100` |
//! | `AI_RATE_LIMIT_MAX` | `1000` |
//! | `BODY_LIMIT_BYTES` | `10485760` |
//! | `COMPRESSION_MIN_BYTES` | `1024` |
//! | `REQUEST_TIMEOUT_SECS` | `30` |
//! | `API_DOCS_PATH` | unset |
//! | `API_VERSION` | `1.0.0` |
//! | `PLATFORM_NAME` | `catalog-api` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Runtime mode. Only production hides internal error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Parse a mode name. Unknown names fall back to development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

/// Optional HTTPS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub enabled: bool,
    pub port: u16,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 3443,
            cert_path: PathBuf::from("certs/server.crt"),
            key_path: PathBuf::from("certs/server.key"),
        }
    }
}

/// CORS allow-list. Entries are exact origins or `scheme://host:*` patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:*".to_string(),
                "https://localhost:*".to_string(),
                "http://127.0.0.1:*".to_string(),
            ],
            max_age: Duration::from_secs(86_400),
        }
    }
}

/// Limits for the two rate-limit policies. Both share one window length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window: Duration,
    pub max_requests: u32,
    pub ai_max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
            ai_max_requests: 1000,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub environment: Environment,
    pub tls: TlsConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub body_limit_bytes: usize,
    pub compression_min_bytes: u16,
    pub request_timeout: Duration,
    pub api_docs_path: Option<PathBuf>,
    pub api_version: String,
    pub platform: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
            tls: TlsConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            body_limit_bytes: 10 * 1024 * 1024,
            compression_min_bytes: 1024,
            request_timeout: Duration::from_secs(30),
            api_docs_path: None,
            api_version: "1.0.0".to_string(),
            platform: "catalog-api".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Unset or blank keys keep their defaults; set keys that fail to parse are
    /// reported rather than silently ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mut tls = TlsConfig {
            enabled: parse_or(&get, "ENABLE_HTTPS", defaults.tls.enabled, parse_bool)?,
            port: parse_or(&get, "HTTPS_PORT", defaults.tls.port, parse_number)?,
            ..defaults.tls.clone()
        };
        if let Some(path) = get("SSL_CERT_PATH") {
            tls.cert_path = PathBuf::from(path);
        }
        if let Some(path) = get("SSL_KEY_PATH") {
            tls.key_path = PathBuf::from(path);
        }

        let cors = CorsConfig {
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_else(|| defaults.cors.allowed_origins.clone()),
            max_age: defaults.cors.max_age,
        };

        let rate_limit = RateLimitConfig {
            enabled: parse_or(&get, "RATE_LIMIT_ENABLED", defaults.rate_limit.enabled, parse_bool)?,
            window: Duration::from_secs(parse_or(
                &get,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window.as_secs(),
                parse_positive,
            )?),
            max_requests: parse_or(
                &get,
                "RATE_LIMIT_MAX",
                defaults.rate_limit.max_requests,
                parse_positive,
            )?,
            ai_max_requests: parse_or(
                &get,
                "AI_RATE_LIMIT_MAX",
                defaults.rate_limit.ai_max_requests,
                parse_positive,
            )?,
        };

        Ok(Self {
            port: parse_or(&get, "PORT", defaults.port, parse_number)?,
            environment: get("APP_ENV")
                .map(|v| Environment::parse(&v))
                .unwrap_or(defaults.environment),
            tls,
            cors,
            rate_limit,
            body_limit_bytes: parse_or(
                &get,
                "BODY_LIMIT_BYTES",
                defaults.body_limit_bytes,
                parse_positive,
            )?,
            compression_min_bytes: parse_or(
                &get,
                "COMPRESSION_MIN_BYTES",
                defaults.compression_min_bytes,
                parse_number,
            )?,
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
                parse_positive,
            )?),
            api_docs_path: get("API_DOCS_PATH").map(PathBuf::from),
            api_version: get("API_VERSION").unwrap_or(defaults.api_version),
            platform: get("PLATFORM_NAME").unwrap_or(defaults.platform),
        })
    }
}

fn parse_or<T, G, P>(get: &G, key: &str, default: T, parse: P) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => parse(raw.trim()).map_err(|reason| ConfigError {
            key: key.to_string(),
            value: raw,
            reason,
        }),
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

fn parse_number<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| e.to_string())
}

fn parse_positive<T>(raw: &str) -> Result<T, String>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let value = parse_number::<T>(raw)?;
    if value == T::default() {
        return Err("must be greater than zero".to_string());
    }
    Ok(value)
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
    fn defaults_when_nothing_set() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.rate_limit.window, Duration::from_secs(900));
        assert!(!config.tls.enabled);
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("APP_ENV", "Production"),
            ("ENABLE_HTTPS", "yes"),
            ("SSL_CERT_PATH", "/tls/cert.pem"),
            ("CORS_ALLOWED_ORIGINS", "https://shop.example.com, http://localhost:*"),
            ("RATE_LIMIT_MAX", "5"),
            ("REQUEST_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.environment.is_production());
        assert!(config.tls.enabled);
        assert_eq!(config.tls.cert_path, PathBuf::from("/tls/cert.pem"));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://shop.example.com", "http://localhost:*"]
        );
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[("PORT", "  ")])).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn rejects_unparseable_values() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.key, "PORT");
        assert_eq!(err.value, "eighty");

        let err = ServiceConfig::from_lookup(lookup(&[("ENABLE_HTTPS", "maybe")])).unwrap_err();
        assert_eq!(err.key, "ENABLE_HTTPS");

        let err = ServiceConfig::from_lookup(lookup(&[("RATE_LIMIT_MAX", "0")])).unwrap_err();
        assert!(err.reason.contains("greater than zero"));
    }

    #[test]
    fn environment_parse() {
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("test"), Environment::Test);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }
}

//! # API Configuration
//!
//! Environment-based configuration for the customer API service.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use customer_persistence::{ReadStrategy, ServiceConfig};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{backend} backend requested but the `{feature}` feature is not compiled in")]
    BackendUnavailable {
        backend: &'static str,
        feature: &'static str,
    },
}

/// Which Store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "scylla" => Ok(Self::Scylla),
            other => Err(format!("unknown store backend {other}")),
        }
    }
}

/// Which cache implementation sits in front of the Store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend {other}")),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Store backend
    pub store: StoreBackend,

    /// Cache backend
    pub cache: CacheBackend,

    /// ScyllaDB configuration
    pub scylla: ScyllaConfig,

    /// Redis configuration
    pub redis: RedisConfig,

    /// Cache strategy knobs
    pub service: ServiceConfig,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

/// ScyllaDB connection configuration
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub namespace: String,
}

fn parse<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None => Ok(default),
        Some("true" | "1") => Ok(true),
        Some("false" | "0") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
            reason: "expected true/false/1/0".to_string(),
        }),
    }
}

fn split_list(raw: Option<String>, default: &str) -> Vec<String> {
    raw.as_deref()
        .unwrap_or(default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let service = ServiceConfig::new()
            .with_read_strategy(parse(
                "READ_STRATEGY",
                lookup("READ_STRATEGY"),
                ReadStrategy::CacheFirst,
            )?)
            .with_populate_on_create(parse_bool(
                "POPULATE_ON_CREATE",
                lookup("POPULATE_ON_CREATE"),
                false,
            )?);

        Ok(Self {
            server_addr: parse(
                "SERVER_ADDR",
                lookup("SERVER_ADDR"),
                SocketAddr::from(([0, 0, 0, 0], 8080)),
            )?,

            store: parse("STORE_BACKEND", lookup("STORE_BACKEND"), StoreBackend::Memory)?,

            cache: parse("CACHE_BACKEND", lookup("CACHE_BACKEND"), CacheBackend::Memory)?,

            scylla: ScyllaConfig {
                hosts: split_list(lookup("SCYLLA_HOSTS"), "127.0.0.1:9042"),
                keyspace: lookup("SCYLLA_KEYSPACE")
                    .unwrap_or_else(|| "customer_service".to_string()),
                username: lookup("SCYLLA_USERNAME"),
                password: lookup("SCYLLA_PASSWORD"),
            },

            redis: RedisConfig {
                url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                namespace: lookup("CACHE_NAMESPACE").unwrap_or_else(|| "customers".to_string()),
            },

            service,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            cors_origins: split_list(lookup("CORS_ORIGINS"), "*"),
        })
    }
}

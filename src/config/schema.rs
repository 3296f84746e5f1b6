//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application. All types derive Serde traits for deserialization from
//! TOML config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::AppMetadata;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MvcConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Descriptive application data echoed in response headers.
    pub app: AppConfig,

    /// Project layout and framework behavior.
    pub project: ProjectConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl AppConfig {
    pub fn metadata(&self) -> AppMetadata {
        AppMetadata {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }
}

/// Development or production behavior.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }

    /// Parses `development`/`dev` and `production`/`prod`, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(RunMode::Development),
            "production" | "prod" => Some(RunMode::Production),
            _ => None,
        }
    }
}

/// Project layout and framework behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root that statics and relative directories resolve against.
    pub root: PathBuf,

    /// Development enables short template caching and unminified assets.
    pub mode: RunMode,

    /// URL paths served from same-named directories under `root`.
    pub statics: Vec<String>,

    /// Directories relative to the parent of `root`, served under `/__/<dir>`.
    pub other_statics: Vec<String>,

    /// Directory served under `/__vendor`.
    pub vendor_dir: Option<PathBuf>,

    /// Partial directory name below each bound root.
    pub partials_dir: String,

    /// Layout directory name below each bound root.
    pub layouts_dir: String,

    /// Extra partial directories.
    pub extra_partials: Vec<PathBuf>,

    /// Error template directory; defaults to `<bound root>/errors`.
    pub errors_dir: Option<PathBuf>,

    /// Answer unmatched requests with the catalog 404 instead of a bare 404.
    pub catch_all_404: bool,

    /// Bind controller marker files that have no registered handler.
    pub auto_bind_controllers: bool,

    /// Overrides the mode's template cache TTL. `0` caches forever.
    pub cache_ttl_ms: Option<u64>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: RunMode::Development,
            statics: Vec::new(),
            other_statics: Vec::new(),
            vendor_dir: None,
            partials_dir: "partials".to_string(),
            layouts_dir: "layouts".to_string(),
            extra_partials: Vec::new(),
            errors_dir: None,
            catch_all_404: true,
            auto_bind_controllers: true,
            cache_ttl_ms: None,
        }
    }
}

impl ProjectConfig {
    /// `None` means compiled templates never expire.
    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_ttl_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => match self.mode {
                RunMode::Development => Some(crate::view::cache::DEVELOPMENT_TTL),
                RunMode::Production => None,
            },
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "convention_mvc=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

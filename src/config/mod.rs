//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (APP_ENV, MVC_ROOT, MVC_BIND)
//!     → validation.rs (semantic checks)
//!     → MvcConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AppConfig, ListenerConfig, LimitsConfig, LogFormat, MvcConfig, ObservabilityConfig,
    ProjectConfig, RunMode, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};

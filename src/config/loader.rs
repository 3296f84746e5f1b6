//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{MvcConfig, RunMode};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment variable selecting development or production mode.
pub const MODE_ENV: &str = "APP_ENV";
/// Environment variable overriding the project root.
pub const ROOT_ENV: &str = "MVC_ROOT";
/// Environment variable overriding the bind address.
pub const BIND_ENV: &str = "MVC_BIND";

/// Load, apply environment overrides to, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<MvcConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: MvcConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Applies `APP_ENV`, `MVC_ROOT` and `MVC_BIND` through `lookup`.
pub fn apply_env_overrides<F>(config: &mut MvcConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(MODE_ENV) {
        match RunMode::parse(&raw) {
            Some(mode) => config.project.mode = mode,
            None => tracing::warn!(value = %raw, "Ignoring unknown {}", MODE_ENV),
        }
    }
    if let Some(root) = lookup(ROOT_ENV) {
        config.project.root = PathBuf::from(root);
    }
    if let Some(bind) = lookup(BIND_ENV) {
        config.listener.bind_address = bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nbind_address = \"127.0.0.1:4000\"\n[app]\nname = \"site\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.app.name, "site");
    }

    #[test]
    fn test_load_reports_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_body_bytes = 0").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors == &vec![ValidationError::BodyLimit]));
        assert!(err.to_string().contains("max_body_bytes"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/no/such/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = MvcConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            MODE_ENV => Some("production".into()),
            ROOT_ENV => Some("/srv/site".into()),
            _ => None,
        });
        assert_eq!(config.project.mode, RunMode::Production);
        assert_eq!(config.project.root, PathBuf::from("/srv/site"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }
}

//! Semantic configuration checks.
//!
//! Serde only checks shape; these rules check values that would make the
//! application fail at bind or listen time.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::MvcConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("project.statics entry `{0}` must start with '/' and must not be '/'")]
    StaticPath(String),

    #[error("project.other_statics entry `{0}` must be a relative directory")]
    OtherStaticPath(String),

    #[error("project.{0} must not be empty")]
    EmptyDirectoryName(&'static str),

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("limits.max_body_bytes must be greater than zero")]
    BodyLimit,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Returns every problem found, not just the first.
pub fn validate_config(config: &MvcConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for path in &config.project.statics {
        let trimmed = path.trim_end_matches('/');
        if !path.starts_with('/') || trimmed.is_empty() {
            errors.push(ValidationError::StaticPath(path.clone()));
        }
    }

    for dir in &config.project.other_statics {
        let trimmed = dir.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|segment| segment == "..") {
            errors.push(ValidationError::OtherStaticPath(dir.clone()));
        }
    }

    if config.project.partials_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyDirectoryName("partials_dir"));
    }
    if config.project.layouts_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyDirectoryName("layouts_dir"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::BodyLimit);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

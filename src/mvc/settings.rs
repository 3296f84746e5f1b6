//! Per-controller JSON config files.
//!
//! A config file is a JSON object. Its optional `development` and
//! `production` blocks are deep-merged over the top level for the
//! matching mode and then removed.

use std::path::Path;

use serde_json::{Map, Value};

use super::ViewError;
use crate::config::RunMode;

/// Reads the config file at `path`. A missing path or file yields an empty
/// object.
pub async fn load(path: Option<&Path>, mode: RunMode) -> Result<Map<String, Value>, ViewError> {
    let Some(path) = path else {
        return Ok(Map::new());
    };

    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(source) => {
            return Err(ViewError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let parsed: Value = serde_json::from_slice(&raw).map_err(|source| ViewError::Settings {
        path: path.to_path_buf(),
        source,
    })?;
    match parsed {
        Value::Object(map) => Ok(apply_mode(map, mode)),
        _ => Ok(Map::new()),
    }
}

/// Merges the block named after `mode` over the rest and drops both
/// mode blocks.
pub fn apply_mode(mut raw: Map<String, Value>, mode: RunMode) -> Map<String, Value> {
    let development = raw.remove(RunMode::Development.as_str());
    let production = raw.remove(RunMode::Production.as_str());
    let overlay = match mode {
        RunMode::Development => development,
        RunMode::Production => production,
    };

    let mut merged = Value::Object(raw);
    if let Some(overlay) = overlay {
        deep_merge(&mut merged, overlay);
    }
    match merged {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Recursively merges `overlay` into `base`. Objects merge key by key;
/// any other overlay value replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                deep_merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

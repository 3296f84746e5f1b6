//! Template source scanning.
//!
//! Views declare their parent layout with a leading `{#< name #}` comment
//! and pull in partials with `{% include "name" %}`. Both are plain
//! minijinja syntax, so a view still renders standalone.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use super::TemplateError;

static LAYOUT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{#<\s*([\w/.\-]+)\s*-?#\}").expect("layout marker pattern is valid")
});

static PARTIAL_INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{%-?\s*include\s+["']([^"']+)["']"#).expect("include pattern is valid")
});

/// Parent layout named by the first layout marker in `source`.
pub fn extract_layout(source: &str) -> Option<String> {
    LAYOUT_MARKER
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Every partial `source` includes, in order of first appearance.
pub fn extract_partial_names(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PARTIAL_INCLUDE.captures_iter(source) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Registration name of a template file: its path relative to `root`,
/// without extension, `/`-separated.
pub fn template_name(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// All template files below `dir`, sorted by path. Hidden files are
/// skipped and a missing directory yields nothing.
pub fn template_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, TemplateError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| TemplateError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if let Some(name) = template_name(dir, entry.path()) {
            files.push((name, entry.into_path()));
        }
    }
    Ok(files)
}

/// Reads every template below `dir` into `(name, source)` pairs.
pub fn read_templates(dir: &Path) -> Result<Vec<(String, String)>, TemplateError> {
    template_files(dir)?
        .into_iter()
        .map(|(name, path)| {
            std::fs::read_to_string(&path)
                .map(|source| (name, source))
                .map_err(|source| TemplateError::Io { path, source })
        })
        .collect()
}

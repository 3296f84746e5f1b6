//! Controller asset lists.
//!
//! Development lists the unminified `.css`/`.js` files of a controller's
//! `<Stem>Assets/` directory; production lists the `.min` variants, or the
//! plain file when no minified sibling exists. Config-declared files are
//! prepended in this order: `dependencies` (split by extension), then
//! `css`/`styles`/`stylesheets` and `js`/`scripts`/`javascripts`.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::RunMode;

/// Resolved `<link>`/`<script>` URLs handed to templates as `assets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetList {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

/// A controller's asset directory and the URL it is served under.
#[derive(Debug, Clone)]
pub struct AssetSource {
    pub dir: PathBuf,
    pub url: String,
}

impl AssetSource {
    pub fn new(dir: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url: url.into(),
        }
    }

    /// Lists the directory's top-level files for `mode`. A missing
    /// directory yields empty lists.
    pub async fn discover(&self, mode: RunMode) -> std::io::Result<AssetList> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AssetList::default()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(select(&names, &self.url, mode))
    }
}

/// Picks the files of `names` that apply in `mode` and maps them to URLs.
pub fn select(names: &[String], url: &str, mode: RunMode) -> AssetList {
    let base = url.trim_end_matches('/');
    let mut list = AssetList::default();

    for name in names {
        let (target, ext) = if name.ends_with(".css") {
            (&mut list.css, ".css")
        } else if name.ends_with(".js") {
            (&mut list.js, ".js")
        } else {
            continue;
        };

        let stem = &name[..name.len() - ext.len()];
        let wanted = match (mode, stem.strip_suffix(".min")) {
            (RunMode::Development, minified) => minified.is_none(),
            (RunMode::Production, Some(_)) => true,
            (RunMode::Production, None) => {
                let minified = format!("{stem}.min{ext}");
                !names.iter().any(|n| *n == minified)
            }
        };
        if wanted {
            target.push(format!("{}/{}", base, urlencoding::encode(name)));
        }
    }
    list
}

/// Prepends config-declared files to `discovered`.
pub fn resolve(discovered: AssetList, config: &Map<String, Value>) -> AssetList {
    let mut css = Vec::new();
    let mut js = Vec::new();

    for dependency in strings(config.get("dependencies")) {
        if dependency.ends_with(".css") {
            css.push(dependency);
        } else if dependency.ends_with(".js") {
            js.push(dependency);
        }
    }
    for key in ["css", "styles", "stylesheets"] {
        css.extend(strings(config.get(key)));
    }
    for key in ["js", "scripts", "javascripts"] {
        js.extend(strings(config.get(key)));
    }

    css.extend(discovered.css);
    js.extend(discovered.js);
    AssetList { css, js }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

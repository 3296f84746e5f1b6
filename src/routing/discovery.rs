//! File-name conventions mapping a project tree to handlers.
//!
//! | File              | Kind       | Context            |
//! |-------------------|------------|--------------------|
//! | `MyController`    | controller | `/`                |
//! | `shop/CartCtrl`   | controller | `/shop`            |
//! | `apis/ExpressApi` | api        | `/apis/express`    |
//!
//! A controller `<Stem>Ctrl`/`<Stem>Controller` has the companions
//! `<Stem>Model`, `<Stem>View.html`, `<Stem>Assets/` and
//! `<Stem>Config.json`, all siblings of the controller file.
//! Classification is a pure function of the path; the extension is ignored.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

static API_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<stem>.+)Api$").expect("api name pattern is valid"));

static CONTROLLER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<stem>.+?)(?:Ctrl|Controller)$").expect("controller name pattern is valid")
});

pub const VIEW_EXTENSION: &str = "html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Api,
    Controller,
}

impl HandlerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::Api => "api",
            HandlerKind::Controller => "controller",
        }
    }
}

/// What a handler file name implies, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub kind: HandlerKind,
    /// Logical source path: relative, `/`-separated, no extension.
    pub source: String,
    pub stem: String,
    /// Directory segments between the root and the file.
    pub dir: Vec<String>,
    /// URL prefix the handler is bound under; `/` for the root.
    pub context: String,
    pub model_name: String,
    /// Logical source path of the companion model.
    pub model_source: String,
}

impl Descriptor {
    fn sibling(&self, root: &Path, name: String) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.dir);
        path.push(name);
        path
    }

    pub fn view_file(&self, root: &Path) -> PathBuf {
        self.sibling(root, format!("{}View.{}", self.stem, VIEW_EXTENSION))
    }

    pub fn assets_dir(&self, root: &Path) -> PathBuf {
        self.sibling(root, format!("{}Assets", self.stem))
    }

    pub fn config_file(&self, root: &Path) -> PathBuf {
        self.sibling(root, format!("{}Config.json", self.stem))
    }

    /// URL the assets directory is served under.
    pub fn assets_url(&self) -> String {
        format!("{}/{}Assets", self.context.trim_end_matches('/'), urlencoding::encode(&self.stem))
    }
}

/// Classifies a relative handler path such as `apis/ExpressApi.rs`.
pub fn classify(relative: &str) -> Option<Descriptor> {
    let mut segments: Vec<&str> = relative
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let file = segments.pop()?;
    let name = match file.rsplit_once('.') {
        Some((name, _)) if !name.is_empty() => name,
        _ => file,
    };
    let dir: Vec<String> = segments.iter().map(|s| s.to_string()).collect();

    let (kind, stem) = if let Some(caps) = API_NAME.captures(name) {
        (HandlerKind::Api, caps["stem"].to_string())
    } else if let Some(caps) = CONTROLLER_NAME.captures(name) {
        (HandlerKind::Controller, caps["stem"].to_string())
    } else {
        return None;
    };

    let context = match kind {
        HandlerKind::Controller => context_path(&dir),
        HandlerKind::Api => {
            let mut segments = dir.clone();
            segments.push(lower_camel(&stem));
            context_path(&segments)
        }
    };
    let prefix: String = dir.iter().map(|s| format!("{s}/")).collect();

    Some(Descriptor {
        kind,
        source: format!("{prefix}{name}"),
        model_name: format!("{}Model", lower_camel(&stem)),
        model_source: format!("{prefix}{stem}Model"),
        stem,
        dir,
        context,
    })
}

/// `ThirdExpress` -> `thirdExpress`.
pub fn lower_camel(stem: &str) -> String {
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `/`-joined, percent-encoded segments; `/` when empty.
pub fn context_path<S: AsRef<str>>(segments: &[S]) -> String {
    let encoded: Vec<String> = segments
        .iter()
        .map(|s| urlencoding::encode(s.as_ref()).into_owned())
        .collect();
    format!("/{}", encoded.join("/"))
}

/// Walks `root` and classifies every handler file, sorted by path.
///
/// Hidden entries and the listed `skip` directories (partials, layouts,
/// statics) are not descended into.
pub fn scan(root: &Path, skip: &[PathBuf]) -> Result<Vec<Descriptor>, walkdir::Error> {
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
            !hidden && !skip.iter().any(|dir| entry.path() == dir)
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if let Some(descriptor) = classify(&relative.join("/")) {
            found.push(descriptor);
        }
    }
    Ok(found)
}

//! HTML error pages rendered from a project's error template directory.
//!
//! A template named after the status code (`404.html`) wins over the
//! generic `default.html`. Pages receive `status`, `error` (the reason
//! phrase, also as `reason`), `name` and `message` in their context.

use std::collections::HashSet;
use std::path::PathBuf;

use minijinja::{context, AutoEscape, Environment};

use super::ErrorKind;
use crate::view::{source, TemplateError};

/// Name of the fallback template used when no per-status page exists.
pub const DEFAULT_ERROR_TEMPLATE: &str = "default";

/// Compiled error pages for one project root.
pub struct ErrorTemplates {
    env: Environment<'static>,
    names: HashSet<String>,
}

impl ErrorTemplates {
    /// Loads every template under `dir`. Returns `None` when the directory
    /// is missing or holds no templates.
    pub async fn load(dir: PathBuf) -> Result<Option<Self>, TemplateError> {
        let sources = tokio::task::spawn_blocking(move || source::read_templates(&dir)).await??;
        if sources.is_empty() {
            return Ok(None);
        }
        Self::from_sources(sources).map(Some)
    }

    /// Builds the page set from `(name, source)` pairs.
    pub fn from_sources<I, N, S>(sources: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        let mut names = HashSet::new();

        for (name, source) in sources {
            let name = name.into();
            env.add_template_owned(name.clone(), source.into())
                .map_err(|source| TemplateError::Template {
                    name: name.clone(),
                    source,
                })?;
            names.insert(name);
        }

        Ok(Self { env, names })
    }

    /// Whether a page would be rendered for `kind`.
    pub fn covers(&self, kind: ErrorKind) -> bool {
        self.template_for(kind).is_some()
    }

    fn template_for(&self, kind: ErrorKind) -> Option<&str> {
        let code = kind.code().to_string();
        self.names
            .get(&code)
            .or_else(|| self.names.get(DEFAULT_ERROR_TEMPLATE))
            .map(String::as_str)
    }

    /// Renders the page for `kind`, or `None` when no page applies or the
    /// page fails to render.
    pub fn render(&self, kind: ErrorKind, message: Option<&serde_json::Value>) -> Option<String> {
        let name = self.template_for(kind)?;
        let rendered = self.env.get_template(name).and_then(|template| {
            template.render(context! {
                status => kind.code(),
                error => kind.reason(),
                reason => kind.reason(),
                name => kind.name(),
                message => message,
            })
        });

        match rendered {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::error!(template = name, error = %e, "Failed to render error page");
                None
            }
        }
    }
}

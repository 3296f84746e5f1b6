//! Template engine: partial registration, view compilation and layouts.
//!
//! # Responsibilities
//! - Register partials from the project's partial directories
//! - Index layouts by name and compile them on demand
//! - Compile view files into [`CompiledView`]s, cached per path
//! - Render a view and walk its chain of parent layouts
//!
//! # Design Decisions
//! - The minijinja environment sits behind an [`ArcSwap`]; registrations
//!   publish a new environment with `rcu` while renders keep the snapshot
//!   they loaded
//! - Every template is HTML auto-escaped; layouts receive the rendered
//!   child as the safe `content` (alias `body`) variable
//! - A layout chain that revisits a layout is rejected instead of looping

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

use super::cache::TemplateCache;
use super::{builtins, helpers, source, TemplateError};

/// Template name used for views that have no template file.
const EMPTY_VIEW: &str = "<empty>";

/// Directory names the engine reads below a project root.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub partials_dir: String,
    pub layouts_dir: String,
    /// Extra partial directories, resolved against the root when relative.
    pub extra_partials: Vec<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            partials_dir: "partials".to_string(),
            layouts_dir: "layouts".to_string(),
            extra_partials: Vec::new(),
        }
    }
}

/// A view or layout compiled and registered with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledView {
    pub template_name: String,
    pub parent_layout: Option<String>,
    pub partial_names: Vec<String>,
}

/// Layouts compile exactly like views.
pub type Layout = CompiledView;

/// What [`TemplateEngine::load_root`] registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub partials: usize,
    pub layouts: Vec<String>,
}

pub struct TemplateEngine {
    env: ArcSwap<Environment<'static>>,
    cache: TemplateCache<Arc<CompiledView>>,
    layouts: DashMap<String, PathBuf>,
    options: EngineOptions,
}

impl TemplateEngine {
    pub fn new(options: EngineOptions, cache: TemplateCache<Arc<CompiledView>>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        helpers::register(&mut env);
        if let Err(e) = builtins::register(&mut env) {
            tracing::error!(error = %e, "Failed to register built-in partials");
        }

        Self {
            env: ArcSwap::from_pointee(env),
            cache,
            layouts: DashMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Applies `hook` to a copy of the environment and publishes it.
    ///
    /// Used to add application helpers, filters or globals.
    pub fn configure<F>(&self, hook: F)
    where
        F: Fn(&mut Environment<'static>),
    {
        self.env.rcu(|current| {
            let mut next = Environment::clone(current);
            hook(&mut next);
            next
        });
    }

    fn register_template(&self, name: &str, source: &str) -> Result<(), TemplateError> {
        let mut failure = None;
        self.env.rcu(|current| {
            let mut next = Environment::clone(current);
            failure = next
                .add_template_owned(name.to_string(), source.to_string())
                .err();
            next
        });

        match failure {
            Some(source) => Err(TemplateError::Template {
                name: name.to_string(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Registers partials and indexes layouts found below `root`.
    pub async fn load_root(&self, root: &Path) -> Result<LoadReport, TemplateError> {
        let mut dirs = vec![root.join(&self.options.partials_dir)];
        dirs.extend(self.options.extra_partials.iter().map(|dir| root.join(dir)));

        let partials = self.load_partials(dirs).await?;
        let layouts = self.load_layouts(root.join(&self.options.layouts_dir)).await?;
        Ok(LoadReport { partials, layouts })
    }

    /// Registers every template below `dirs` as a partial named by its
    /// relative path. Later directories override earlier ones.
    pub async fn load_partials(&self, dirs: Vec<PathBuf>) -> Result<usize, TemplateError> {
        let sources = tokio::task::spawn_blocking(move || {
            let mut all = Vec::new();
            for dir in &dirs {
                all.extend(source::read_templates(dir)?);
            }
            Ok::<_, TemplateError>(all)
        })
        .await??;

        for (name, text) in &sources {
            tracing::debug!(partial = %name, "Registering partial");
            self.register_template(name, text)?;
        }
        Ok(sources.len())
    }

    /// Indexes every template below `dir` as a layout and compiles it.
    pub async fn load_layouts(&self, dir: PathBuf) -> Result<Vec<String>, TemplateError> {
        let files = tokio::task::spawn_blocking(move || source::template_files(&dir)).await??;

        let mut names = Vec::with_capacity(files.len());
        for (name, path) in files {
            self.layouts.insert(name.clone(), path.clone());
            self.compile(Some(&path)).await?;
            tracing::debug!(layout = %name, "Registered layout");
            names.push(name);
        }
        Ok(names)
    }

    /// Compiles the view at `path`, reusing a fresh cached compilation.
    ///
    /// A missing file compiles to an empty template.
    pub async fn compile(&self, path: Option<&Path>) -> Result<Arc<CompiledView>, TemplateError> {
        let key = path
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| EMPTY_VIEW.to_string());
        let owned = path.map(Path::to_path_buf);
        let name = key.clone();

        self.cache
            .get_or_try_insert_with(&key, || async move {
                let text = match &owned {
                    Some(path) => read_view(path).await?,
                    None => String::new(),
                };
                self.register_template(&name, &text)?;
                Ok(Arc::new(CompiledView {
                    parent_layout: source::extract_layout(&text),
                    partial_names: source::extract_partial_names(&text),
                    template_name: name,
                }))
            })
            .await
    }

    /// Compiled layout registered under `name`.
    pub async fn layout(&self, name: &str) -> Result<Arc<Layout>, TemplateError> {
        let path = self
            .layouts
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TemplateError::UnknownLayout(name.to_string()))?;
        self.compile(Some(&path)).await
    }

    pub fn has_layout(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Renders a compiled template with `ctx`.
    pub fn render<S: Serialize>(&self, compiled: &CompiledView, ctx: S) -> Result<String, TemplateError> {
        let env = self.env.load();
        let wrap = |source| TemplateError::Template {
            name: compiled.template_name.clone(),
            source,
        };
        let template = env.get_template(&compiled.template_name).map_err(wrap)?;
        template.render(ctx).map_err(wrap)
    }

    /// Wraps `rendered` in `first` and each of its ancestors in turn.
    pub async fn apply_layouts(
        &self,
        first: Option<&str>,
        mut rendered: String,
        data: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        let mut visited = HashSet::new();
        let mut next = first.map(str::to_owned);

        while let Some(name) = next {
            if !visited.insert(name.clone()) {
                return Err(TemplateError::LayoutCycle(name));
            }
            let layout = self.layout(&name).await?;
            rendered = self.render(&layout, layout_context(data, rendered))?;
            next = layout.parent_layout.clone();
        }
        Ok(rendered)
    }

    /// Compiles, renders and lays out the view at `path`.
    pub async fn render_view(&self, path: Option<&Path>, data: &serde_json::Value) -> Result<String, TemplateError> {
        let compiled = self.compile(path).await?;
        let rendered = self.render(&compiled, data)?;
        self.apply_layouts(compiled.parent_layout.as_deref(), rendered, data).await
    }
}

async fn read_view(path: &Path) -> Result<String, TemplateError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(TemplateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn layout_context(data: &serde_json::Value, rendered: String) -> minijinja::Value {
    let mut ctx: BTreeMap<String, minijinja::Value> = BTreeMap::new();
    if let Some(object) = data.as_object() {
        for (key, value) in object {
            ctx.insert(key.clone(), minijinja::Value::from_serialize(value));
        }
    }
    let content = minijinja::Value::from_safe_string(rendered);
    ctx.insert("body".to_string(), content.clone());
    ctx.insert("content".to_string(), content);
    minijinja::Value::from(ctx)
}

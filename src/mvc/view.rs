//! The render pipeline a controller composes over.
//!
//! # Data Flow
//! ```text
//! model data (or the exchange itself)
//!     + locals from middleware
//!     + config   = <Stem>Config.json (mode block applied) ⊕ model config
//!     + assets   = config files ++ <Stem>Assets/ listing
//!     → compiled view → view_parser → layout chain → HTML
//! ```
//!
//! Failures while building data fall back to rendering the exchange.
//! Template failures are logged and their message becomes the body.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::assets::{self, AssetSource};
use super::model::ModelFactory;
use super::{settings, ViewError};
use crate::config::RunMode;
use crate::http::Exchange;
use crate::observability::metrics;
use crate::view::{TemplateEngine, TemplateError};

/// Post-render hook applied to a view's own output, before layouts.
pub type ViewParser = Arc<dyn Fn(&Exchange, String) -> String + Send + Sync>;

#[derive(Clone)]
pub struct View {
    engine: Arc<TemplateEngine>,
    mode: RunMode,
    view_file: Option<PathBuf>,
    model: Option<ModelFactory>,
    model_name: String,
    settings_file: Option<PathBuf>,
    assets: Option<AssetSource>,
    parser: Option<ViewParser>,
}

impl View {
    pub fn new(engine: Arc<TemplateEngine>, mode: RunMode) -> Self {
        Self {
            engine,
            mode,
            view_file: None,
            model: None,
            model_name: String::new(),
            settings_file: None,
            assets: None,
            parser: None,
        }
    }

    pub fn with_view_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.view_file = Some(path.into());
        self
    }

    pub fn with_model(mut self, name: impl Into<String>, factory: Option<ModelFactory>) -> Self {
        self.model_name = name.into();
        self.model = factory;
        self
    }

    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    pub fn with_assets(mut self, assets: AssetSource) -> Self {
        self.assets = Some(assets);
        self
    }

    pub(crate) fn with_parser(mut self, parser: ViewParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn has_view(&self) -> bool {
        self.view_file.is_some()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn view_file(&self) -> Option<&Path> {
        self.view_file.as_deref()
    }

    /// Template data for `ex`: model (or request) data plus `locals`,
    /// `config` and `assets`.
    pub async fn data(&self, ex: &Exchange) -> Result<Value, ViewError> {
        let (mut data, model_config) = match &self.model {
            Some(factory) => {
                let model = factory(ex);
                let value = model.data(ex).await.map_err(|source| ViewError::Model {
                    model: self.model_name.clone(),
                    source,
                })?;
                let value = if value.is_object() {
                    value
                } else {
                    json!({ "data": value })
                };
                (value, model.config())
            }
            None => (ex.to_value(), Default::default()),
        };

        let mut config = Value::Object(settings::load(self.settings_file.as_deref(), self.mode).await?);
        settings::deep_merge(&mut config, Value::Object(model_config));

        let discovered = match &self.assets {
            Some(source) => source.discover(self.mode).await.unwrap_or_else(|e| {
                tracing::warn!(dir = %source.dir.display(), error = %e, "Failed to list assets");
                Default::default()
            }),
            None => Default::default(),
        };
        let assets = match config.as_object() {
            Some(config) => assets::resolve(discovered, config),
            None => discovered,
        };

        if let Value::Object(map) = &mut data {
            let locals = ex.request.locals().map(|l| l.0.clone()).unwrap_or_default();
            map.entry("locals").or_insert(Value::Object(locals));
            map.insert("config".to_string(), config);
            map.insert("assets".to_string(), json!({ "css": assets.css, "js": assets.js }));
        }
        Ok(data)
    }

    /// Renders the full page for `ex`. Never fails: errors are logged and
    /// rendered as text.
    pub async fn render(&self, ex: &Exchange) -> String {
        let started = Instant::now();
        let data = match self.data(ex).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(model = %self.model_name, error = %e, "Failed to build view data; rendering request");
                ex.to_value()
            }
        };

        let html = match self.parse_template(ex, &data).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(
                    view = ?self.view_file,
                    error = %e,
                    "Failed to render view"
                );
                e.to_string()
            }
        };
        metrics::record_render(started);
        html
    }

    async fn parse_template(&self, ex: &Exchange, data: &Value) -> Result<String, TemplateError> {
        let compiled = self.engine.compile(self.view_file.as_deref()).await?;
        let mut rendered = self.engine.render(&compiled, data)?;
        if let Some(parser) = &self.parser {
            rendered = parser(ex, rendered);
        }
        self.engine
            .apply_layouts(compiled.parent_layout.as_deref(), rendered, data)
            .await
    }

    /// Renders and sends the page with status 200.
    pub async fn send(&self, ex: &mut Exchange) {
        let html = self.render(ex).await;
        ex.response.status(StatusCode::OK);
        ex.response.send(html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::HandlerError;
    use crate::errors::Responder;
    use crate::http::Locals;
    use crate::mvc::model::{model_factory, Model};
    use crate::view::{EngineOptions, TemplateCache};
    use async_trait::async_trait;
    use axum::body::{Body, Bytes};
    use axum::http::Request;
    use serde_json::Map;
    use std::collections::BTreeMap;
    use std::fs;

    struct TitleModel;

    #[async_trait]
    impl Model for TitleModel {
        async fn data(&self, _ex: &Exchange) -> Result<Value, HandlerError> {
            Ok(json!({"title": "Hello"}))
        }

        fn config(&self) -> Map<String, Value> {
            let mut config = Map::new();
            config.insert("owner".into(), json!("model"));
            config
        }
    }

    struct ScalarModel;

    #[async_trait]
    impl Model for ScalarModel {
        async fn data(&self, _ex: &Exchange) -> Result<Value, HandlerError> {
            Ok(json!(42))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl Model for FailingModel {
        async fn data(&self, _ex: &Exchange) -> Result<Value, HandlerError> {
            Err(HandlerError::msg("database down"))
        }
    }

    fn engine() -> Arc<TemplateEngine> {
        Arc::new(TemplateEngine::new(EngineOptions::default(), TemplateCache::new(None)))
    }

    fn exchange() -> Exchange {
        let mut request = Request::builder().uri("/page").body(Body::empty()).unwrap();
        Locals::set(&mut request, "client", "some client");
        let (parts, _) = request.into_parts();
        Exchange::new(parts, Bytes::new(), BTreeMap::new(), Arc::new(Responder::default()))
    }

    #[tokio::test]
    async fn test_model_data_config_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("PageConfig.json"),
            r#"{"tagline": "x", "development": {"tagline": "My little elephant"}, "dependencies": ["/vendor/dep.js"]}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("PageAssets")).unwrap();
        fs::write(dir.path().join("PageAssets/page.css"), "").unwrap();

        let view = View::new(engine(), RunMode::Development)
            .with_model("pageModel", Some(model_factory(|_| TitleModel)))
            .with_settings_file(dir.path().join("PageConfig.json"))
            .with_assets(AssetSource::new(dir.path().join("PageAssets"), "/PageAssets"));

        let data = view.data(&exchange()).await.unwrap();
        assert_eq!(data["title"], "Hello");
        assert_eq!(data["config"]["tagline"], "My little elephant");
        assert_eq!(data["config"]["owner"], "model");
        assert_eq!(data["assets"]["css"], json!(["/PageAssets/page.css"]));
        assert_eq!(data["assets"]["js"], json!(["/vendor/dep.js"]));
        assert_eq!(data["locals"]["client"], "some client");
    }

    #[tokio::test]
    async fn test_scalar_model_data_is_wrapped() {
        let view = View::new(engine(), RunMode::Development)
            .with_model("scalarModel", Some(model_factory(|_| ScalarModel)));
        let data = view.data(&exchange()).await.unwrap();
        assert_eq!(data["data"], 42);
    }

    #[tokio::test]
    async fn test_without_model_renders_request() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("PageView.html"), "{{ path }} {{ locals.client }}").unwrap();

        let view = View::new(engine(), RunMode::Development).with_view_file(dir.path().join("PageView.html"));
        assert!(!view.has_model());
        assert_eq!(view.render(&exchange()).await, "&#x2f;page some client");
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_request() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("PageView.html"), "[{{ title }}]{{ path }}").unwrap();

        let view = View::new(engine(), RunMode::Development)
            .with_view_file(dir.path().join("PageView.html"))
            .with_model("failingModel", Some(model_factory(|_| FailingModel)));
        assert_eq!(view.render(&exchange()).await, "[]&#x2f;page");
    }

    #[tokio::test]
    async fn test_parser_runs_before_layouts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("layouts")).unwrap();
        fs::write(dir.path().join("layouts/default.html"), "<main>{{ content }}</main>").unwrap();
        fs::write(dir.path().join("PageView.html"), "{#< default #}hello").unwrap();

        let engine = engine();
        engine.load_root(dir.path()).await.unwrap();
        let view = View::new(engine, RunMode::Development)
            .with_view_file(dir.path().join("PageView.html"))
            .with_parser(Arc::new(|_, html| html.to_uppercase()));

        let mut ex = exchange();
        view.send(&mut ex).await;
        assert_eq!(ex.response.body().unwrap().as_ref(), b"<main>HELLO</main>");
    }

    #[tokio::test]
    async fn test_render_error_becomes_body() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("PageView.html"), "{#< missing #}x").unwrap();
        let view = View::new(engine(), RunMode::Development).with_view_file(dir.path().join("PageView.html"));
        assert_eq!(view.render(&exchange()).await, "unknown layout `missing`");
    }
}

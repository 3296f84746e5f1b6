//! The hooks every handler shares, and what a handler declares about its routes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::http::Exchange;
use crate::view::TemplateError;

/// What a verb method returns: `Some(value)` is sent as decorated JSON,
/// `None` means the handler responded (or passed) itself.
pub type HandlerResult = Result<Option<Value>, HandlerError>;

/// Failures raised by handlers and models. The dispatcher answers them
/// with a 500.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// Route-scoped middleware, run in declaration order before the handler.
pub type Middleware = Arc<dyn Fn(Request<Body>, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps an async function as [`Middleware`].
pub fn middleware_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request, next| Box::pin(f(request, next)))
}

/// Routing declarations a handler makes about itself.
#[derive(Clone, Default)]
pub struct RouteOptions {
    /// Replaces the context derived from the handler's location.
    pub context: Option<String>,
    /// Extra route patterns, registered longest first.
    pub paths: Vec<String>,
    /// One more pattern, also mirrored under `/{version}`.
    pub alternate: Option<String>,
    pub middleware: Vec<Middleware>,
    /// Names projected onto the positional arguments, in order.
    pub path_config: Vec<String>,
    /// Extra response headers, sent with an `x-` prefix.
    pub headers: Vec<(String, String)>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn with_alternate(mut self, path: impl Into<String>) -> Self {
        self.alternate = Some(path.into());
        self
    }

    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn with_path_config<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_config = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteOptions")
            .field("context", &self.context)
            .field("paths", &self.paths)
            .field("alternate", &self.alternate)
            .field("middleware", &self.middleware.len())
            .field("path_config", &self.path_config)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Hooks shared by APIs and controllers.
///
/// Every hook has a permissive default, so a handler overrides only what
/// it cares about. The dispatcher calls them in this order:
/// `is_request_ok` → `request_ok`/`request_not_ok` → `auth` →
/// `logged_in` (on auth failure) → the verb's `auth_*` hook.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Routing declarations; read once at bind time.
    fn routes(&self) -> RouteOptions {
        RouteOptions::default()
    }

    async fn is_request_ok(&self, _ex: &Exchange) -> bool {
        true
    }

    /// Runs after a successful precheck.
    async fn request_ok(&self, _ex: &mut Exchange) {}

    /// Runs after a failed precheck; responds 400 unless overridden.
    async fn request_not_ok(&self, ex: &mut Exchange) {
        ex.bad_request_error();
    }

    async fn auth(&self, _ex: &Exchange) -> bool {
        true
    }

    /// Decides between 403 (logged in) and 401 when `auth` fails.
    async fn logged_in(&self, _ex: &Exchange) -> bool {
        false
    }

    async fn auth_get(&self, _ex: &Exchange) -> bool {
        true
    }

    async fn auth_post(&self, _ex: &Exchange) -> bool {
        true
    }

    async fn auth_put(&self, _ex: &Exchange) -> bool {
        true
    }

    async fn auth_patch(&self, _ex: &Exchange) -> bool {
        true
    }

    async fn auth_delete(&self, _ex: &Exchange) -> bool {
        true
    }

    async fn auth_head(&self, _ex: &Exchange) -> bool {
        true
    }

    async fn auth_options(&self, _ex: &Exchange) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_options_builder() {
        let options = RouteOptions::new()
            .with_path("/items/{id}")
            .with_alternate("/things")
            .with_path_config(["id", "kind"])
            .with_header("test", "1")
            .with_middleware(middleware_fn(|request, next: Next| next.run(request)));

        assert_eq!(options.paths, vec!["/items/{id}"]);
        assert_eq!(options.alternate.as_deref(), Some("/things"));
        assert_eq!(options.path_config, vec!["id", "kind"]);
        assert_eq!(options.headers, vec![("test".to_string(), "1".to_string())]);
        assert_eq!(options.middleware.len(), 1);
        assert!(format!("{options:?}").contains("middleware: 1"));
    }

    #[test]
    fn test_handler_error_messages() {
        assert_eq!(HandlerError::msg("boom").to_string(), "boom");
        let json_err = serde_json::from_str::<Value>("{").unwrap_err();
        assert!(matches!(HandlerError::from(json_err), HandlerError::Json(_)));
    }
}

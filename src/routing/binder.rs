//! Turns endpoints into axum routes.
//!
//! # Responsibilities
//! - Compute the path set for a handler
//! - Split the positional catch-all into `a`..`z`
//! - Buffer the body, build the [`Exchange`], run the dispatcher
//! - Serve controller asset directories and static roots
//! - Serve a controller's view data as JSON at `<context>/model.json`
//!
//! # Design Decisions
//! - Explicit paths are registered longest first so a short pattern
//!   never masks a more specific one
//! - A path already bound in the same application, or one the router
//!   would reject next to a bound path, is skipped with a warning
//! - The positional tail is split on the raw path, so an encoded `/`
//!   stays inside its segment
//! - More than 26 positional segments pass the request on, as an
//!   unmatched route would

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{FromRequestParts, MatchedPath, RawPathParams, Request, State};
use axum::handler::HandlerWithoutStateExt;
use axum::http::request::Parts;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{any, get, MethodRouter};
use axum::Router;
use tower_http::services::ServeDir;

use crate::dispatch::{dispatch, Endpoint, Middleware, RouteOptions, POSITIONAL_KEYS};
use crate::errors::{ErrorKind, Responder};
use crate::http::{unmatched_response, Exchange};
use crate::mvc::View;
use crate::observability::metrics;

/// File name under a controller's context that serves its view data.
pub const MODEL_JSON: &str = "model.json";

/// Capture name of the positional segment tail.
pub const POSITIONAL_CAPTURE: &str = "params";

/// Everything a route needs to dispatch one request.
pub struct BoundEndpoint {
    pub endpoint: Arc<dyn Endpoint>,
    pub responder: Arc<Responder>,
    pub path_config: Vec<String>,
    pub context: String,
    pub max_body_bytes: usize,
}

/// Paths a handler with `context` and `options` is bound to, in
/// registration order.
pub fn route_paths(context: &str, options: &RouteOptions) -> Vec<String> {
    let mut explicit: Vec<String> = options.paths.iter().filter_map(|p| axum_path(p)).collect();
    explicit.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut paths = explicit;
    if let Some(alternate) = options.alternate.as_deref().and_then(axum_path) {
        let mirrored = if alternate == "/" {
            "/{version}".to_string()
        } else {
            format!("/{{version}}{alternate}")
        };
        paths.push(alternate);
        paths.push(mirrored);
    }

    let base = context.trim_end_matches('/');
    if base.is_empty() {
        paths.push("/".to_string());
    } else {
        paths.push(base.to_string());
        paths.push(format!("{base}/"));
    }
    paths.push(format!("{base}/{{*{POSITIONAL_CAPTURE}}}"));

    let mut seen = HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}

/// Normalizes a declared path to axum syntax: `:name` and `:name?`
/// segments become `{name}`. Paths not starting with `/` are rejected.
pub fn axum_path(raw: &str) -> Option<String> {
    if !raw.starts_with('/') {
        tracing::warn!(path = raw, "Ignoring route path without leading slash");
        return None;
    }
    let segments: Vec<String> = raw
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name.trim_end_matches('?')),
            None => segment.to_string(),
        })
        .collect();
    Some(segments.join("/"))
}

/// Named route captures with the positional tail split into `a`..`z`.
///
/// The tail is expected undecoded; each segment is decoded after the
/// split. `None` when the tail has more segments than there are
/// positional keys.
pub fn split_params<'a, I>(raw: I) -> Option<BTreeMap<String, String>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut params = BTreeMap::new();
    for (key, value) in raw {
        if key != POSITIONAL_CAPTURE {
            params.insert(key.to_string(), value.to_string());
            continue;
        }
        let segments: Vec<&str> = value.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() > POSITIONAL_KEYS.len() {
            return None;
        }
        for (name, segment) in POSITIONAL_KEYS.iter().zip(segments) {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            params.insert(name.to_string(), decoded);
        }
    }
    Some(params)
}

/// The undecoded part of `path` captured by the positional tail of the
/// route pattern `matched`.
pub fn raw_tail<'a>(matched: &str, path: &'a str) -> Option<&'a str> {
    let (prefix, _) = matched.split_once(&format!("{{*{POSITIONAL_CAPTURE}}}"))?;
    let depth = prefix.matches('/').count().checked_sub(1)?;
    path.match_indices('/').nth(depth).map(|(i, _)| &path[i + 1..])
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    CatchAll,
}

fn segments(path: &str) -> Vec<Segment<'_>> {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                Segment::CatchAll
            } else if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Segment::Param(name)
            } else {
                Segment::Static(segment)
            }
        })
        .collect()
}

/// Whether the router refuses `candidate` once `existing` is registered.
///
/// Static segments may sit next to captures, but a capture may not sit
/// next to a catch-all or a capture of another name.
pub fn conflicts(existing: &str, candidate: &str) -> bool {
    let (a, b) = (segments(existing), segments(candidate));
    for pair in a.iter().zip(b.iter()) {
        match pair {
            (Segment::Static(x), Segment::Static(y)) if x == y => continue,
            (Segment::Param(x), Segment::Param(y)) if x == y => continue,
            (Segment::Param(_), Segment::Param(_))
            | (Segment::CatchAll, Segment::CatchAll)
            | (Segment::Param(_), Segment::CatchAll)
            | (Segment::CatchAll, Segment::Param(_)) => return true,
            _ => return false,
        }
    }
    a.len() == b.len()
}

/// Adds `bound` under every path not yet in `seen` and not conflicting
/// with it. Middleware runs in declaration order before the dispatcher.
///
/// Returns the paths actually bound.
pub(crate) fn bind_endpoint(
    mut router: Router,
    bound: Arc<BoundEndpoint>,
    paths: &[String],
    route_middleware: &[Middleware],
    seen: &mut Vec<String>,
) -> (Router, Vec<String>) {
    let mut added = Vec::new();
    for path in paths {
        if let Some(existing) = seen.iter().find(|existing| conflicts(existing, path)) {
            tracing::warn!(
                path = %path,
                existing = %existing,
                context = %bound.context,
                "Route conflicts with a bound route; skipping"
            );
            continue;
        }
        seen.push(path.clone());
        let mut method_router: MethodRouter = any(handle).with_state(Arc::clone(&bound));
        for m in route_middleware.iter().rev() {
            method_router = method_router.layer(middleware::from_fn(run_middleware(Arc::clone(m))));
        }
        router = router.route(path, method_router);
        added.push(path.clone());
    }
    (router, added)
}

/// Binds `<context>/model.json` to the JSON form of `view`'s data.
///
/// Returns the path when it was bound.
pub(crate) fn bind_model_json(
    router: Router,
    context: &str,
    view: Arc<View>,
    responder: Arc<Responder>,
    seen: &mut Vec<String>,
) -> (Router, Option<String>) {
    let path = format!("{}/{MODEL_JSON}", context.trim_end_matches('/'));
    if let Some(existing) = seen.iter().find(|existing| conflicts(existing, &path)) {
        tracing::warn!(path = %path, existing = %existing, "Model route conflicts with a bound route; skipping");
        return (router, None);
    }
    seen.push(path.clone());
    let router = router.route(&path, get(model_json).with_state((view, responder)));
    (router, Some(path))
}

async fn model_json(State((view, responder)): State<(Arc<View>, Arc<Responder>)>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let mut ex = Exchange::new(parts, Bytes::new(), BTreeMap::new(), responder);
    match view.data(&ex).await {
        Ok(data) => ex.send_data(data),
        Err(e) => {
            tracing::error!(path = %ex.request.path, error = %e, "Failed to build model data");
            ex.internal_server_error();
        }
    }
    ex.into_response()
}

pub(crate) fn run_middleware(
    m: Middleware,
) -> impl Fn(Request, Next) -> futures_util::future::BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move |request, next| m(request, next)
}

async fn handle(State(bound): State<Arc<BoundEndpoint>>, request: Request) -> Response {
    let started = Instant::now();
    let (mut parts, body) = request.into_parts();

    let raw = RawPathParams::from_request_parts(&mut parts, &()).await.ok();
    let tail = parts
        .extensions
        .get::<MatchedPath>()
        .and_then(|matched| raw_tail(matched.as_str(), parts.uri.path()));
    let captures = raw.iter().flat_map(|p| p.iter()).map(|(key, value)| match (key, tail) {
        (POSITIONAL_CAPTURE, Some(tail)) => (key, tail),
        _ => (key, value),
    });
    let Some(params) = split_params(captures) else {
        return unmatched_response();
    };

    let method = parts.method.clone();
    let body = match axum::body::to_bytes(body, bound.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(context = %bound.context, error = %e, "Failed to read request body");
            let mut ex = Exchange::new(parts, Bytes::new(), params, Arc::clone(&bound.responder));
            ex.payload_too_large_error();
            return ex.into_response();
        }
    };

    let mut ex = Exchange::new(parts, body, params, Arc::clone(&bound.responder));
    dispatch(bound.endpoint.as_ref(), &mut ex, &bound.path_config).await;
    let response = ex.into_response();

    metrics::record_request(method.as_str(), response.status().as_u16(), &bound.context, started);
    response
}

/// Answers with the catalog 404, decorated by `responder`.
pub(crate) async fn not_found(responder: Arc<Responder>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    catalog_error(responder, parts, ErrorKind::NotFound)
}

/// Answers with the catalog error `kind`, decorated by `responder`.
pub(crate) fn catalog_error(responder: Arc<Responder>, parts: Parts, kind: ErrorKind) -> Response {
    let mut ex = Exchange::new(parts, Bytes::new(), BTreeMap::new(), responder);
    ex.error(kind, None);
    ex.into_response()
}

/// Serves `dir` under `url`, answering misses with the catalog 404. A
/// missing directory answers every request under `url` with 404.
pub(crate) fn serve_directory(router: Router, url: &str, dir: &Path, responder: Arc<Responder>) -> Router {
    let url = url.trim_end_matches('/');
    if url.is_empty() {
        tracing::warn!(dir = %dir.display(), "Refusing to serve a directory at the site root");
        return router;
    }

    if !dir.is_dir() {
        tracing::debug!(url, dir = %dir.display(), "Directory missing; answering 404");
        let missing = any(move |request: Request| not_found(Arc::clone(&responder), request));
        return router
            .route(url, missing.clone())
            .route(&format!("{url}/{{*rest}}"), missing);
    }

    let fallback = move |request: Request| not_found(Arc::clone(&responder), request);
    let service = ServeDir::new(dir)
        .append_index_html_on_directories(false)
        .not_found_service(fallback.into_service());
    router.nest_service(url, service)
}

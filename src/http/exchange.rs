//! Request/response pair handed to handlers.
//!
//! # Responsibilities
//! - Expose the parsed request (method, path, query, params, body)
//! - Collect the handler's response (status, headers, body)
//! - Decorate responses with application headers
//! - Render catalog errors as HTML pages or JSON
//!
//! # Design Decisions
//! - The body is buffered before dispatch; handlers never stream
//! - The first body sent wins; later sends are logged and dropped
//! - Once a non-200 status is set, a later 200 is ignored so a success
//!   path cannot clobber an error already decided
//! - A handler may `pass()`; the response then carries an [`Unmatched`]
//!   marker and the application tries the next mount

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};

use crate::errors::{negotiation, ErrorKind, Responder};

/// Response extension marking "no handler here, keep looking".
#[derive(Debug, Clone, Copy)]
pub struct Unmatched;

/// Empty 404 carrying the [`Unmatched`] marker.
pub fn unmatched_response() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    response.extensions_mut().insert(Unmatched);
    response
}

/// Per-request values placed by middleware and exposed to views as `locals`.
#[derive(Debug, Clone, Default)]
pub struct Locals(pub Map<String, Value>);

impl Locals {
    /// Sets `key` on the request's locals, creating them if needed.
    pub fn set(request: &mut Request<Body>, key: impl Into<String>, value: impl Into<Value>) {
        let extensions = request.extensions_mut();
        match extensions.get_mut::<Locals>() {
            Some(locals) => {
                locals.0.insert(key.into(), value.into());
            }
            None => {
                let mut locals = Locals::default();
                locals.0.insert(key.into(), value.into());
                extensions.insert(locals);
            }
        }
    }
}

/// The request side of an [`Exchange`].
#[derive(Debug)]
pub struct RequestInfo {
    pub method: Method,
    pub uri: Uri,
    /// Path and query exactly as received.
    pub original_url: String,
    pub path: String,
    /// Host without port, lowercased.
    pub hostname: String,
    pub headers: HeaderMap,
    pub query: Map<String, Value>,
    /// Route captures: positional `a`..`z`, `version`, and named captures.
    pub params: BTreeMap<String, String>,
    /// Positional arguments projected onto handler-declared names.
    pub path_params: Map<String, Value>,
    pub body: Bytes,
    pub extensions: Extensions,
}

impl RequestInfo {
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> &str {
        self.header(header::CONTENT_TYPE).unwrap_or("")
    }

    pub fn locals(&self) -> Option<&Locals> {
        self.extensions.get::<Locals>()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// The response side of an [`Exchange`].
#[derive(Debug, Default)]
pub struct ResponseSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ResponseSink {
    /// Sets the status, except that a 200 never replaces an error status
    /// and nothing changes once a body was sent.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if self.is_sent() {
            tracing::debug!(status = %status, "Status set after response was sent");
            return self;
        }
        match self.status {
            Some(current) if current != StatusCode::OK && status == StatusCode::OK => {
                tracing::debug!(current = %current, "Ignoring status downgrade to 200");
            }
            _ => self.status = Some(status),
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Dropping invalid response header"),
        }
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_sent(&self) -> bool {
        self.body.is_some()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    fn write(&mut self, content_type: &'static str, body: Bytes) -> &mut Self {
        if self.is_sent() {
            tracing::debug!("Response already sent; dropping second body");
            return self;
        }
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.body = Some(body);
        self
    }

    /// Sends an HTML (or plain) text body.
    pub fn send(&mut self, body: impl Into<String>) -> &mut Self {
        self.write("text/html; charset=utf-8", Bytes::from(body.into()))
    }

    /// Sends `value` serialized as JSON.
    pub fn json(&mut self, value: &Value) -> &mut Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        self.write("application/json", Bytes::from(body))
    }

    /// Finishes the response without a body.
    pub fn end(&mut self) -> &mut Self {
        if !self.is_sent() {
            self.body = Some(Bytes::new());
        }
        self
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = Response::new(Body::from(self.body.unwrap_or_default()));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// One request being handled, plus the response being built for it.
pub struct Exchange {
    pub request: RequestInfo,
    pub response: ResponseSink,
    responder: Arc<Responder>,
    passed: bool,
}

impl Exchange {
    pub fn new(
        parts: Parts,
        body: Bytes,
        params: BTreeMap<String, String>,
        responder: Arc<Responder>,
    ) -> Self {
        let path = parts.uri.path().to_string();
        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| path.clone());
        let hostname = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| parts.uri.host())
            .map(strip_port)
            .unwrap_or_default();
        let query = parse_query(parts.uri.query());

        Self {
            request: RequestInfo {
                method: parts.method,
                uri: parts.uri,
                original_url,
                path,
                hostname,
                headers: parts.headers,
                query,
                params,
                path_params: Map::new(),
                body,
                extensions: parts.extensions,
            },
            response: ResponseSink::default(),
            responder,
            passed: false,
        }
    }

    pub fn responder(&self) -> &Arc<Responder> {
        &self.responder
    }

    /// Declines the request so the next mounted application can answer it.
    pub fn pass(&mut self) {
        self.passed = true;
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    /// Adds `x-version-requested` and the responder's decoration headers.
    pub fn decorate(&mut self) {
        let requested = self
            .request
            .params
            .get("version")
            .map(String::as_str)
            .unwrap_or("latest");
        self.response.header("x-version-requested", requested);
        for (name, value) in self.responder.decoration() {
            self.response.header(&name, value);
        }
    }

    /// Responds with a catalog error.
    ///
    /// HTML-preferring clients get the root's error page when one exists.
    /// Everyone else gets `message` when it is a JSON object or array,
    /// or `{"error": reason, "status": code}`.
    pub fn error(&mut self, kind: ErrorKind, message: Option<Value>) {
        if self.response.is_sent() {
            tracing::warn!(error = kind.name(), "Error raised after response was sent");
            return;
        }
        tracing::debug!(
            error = kind.name(),
            status = kind.code(),
            path = %self.request.path,
            "Responding with error"
        );

        self.response.status(kind.status());
        self.decorate();

        if negotiation::prefers_markup(self.request.header(header::ACCEPT)) {
            if let Some(html) = self.responder.render_error(kind, message.as_ref()) {
                self.response.send(html);
                return;
            }
        }

        match message {
            Some(value @ (Value::Object(_) | Value::Array(_))) => self.response.json(&value),
            _ => self.response.json(&json!({
                "error": kind.reason(),
                "status": kind.code(),
            })),
        };
    }

    /// Responds with the error named `name`, or a 500 for unknown names.
    pub fn error_by_name(&mut self, name: &str) {
        match ErrorKind::from_name(name) {
            Some(kind) => self.error(kind, None),
            None => {
                tracing::error!(name, "Unknown error name");
                self.internal_server_error();
            }
        }
    }

    /// Sends `data` as a decorated 200 JSON response.
    pub fn send_data(&mut self, data: Value) {
        self.response.status(StatusCode::OK);
        self.decorate();
        self.response.json(&data);
    }

    /// Ends the response with `status` and no body.
    pub fn send_status_and_end(&mut self, status: StatusCode) {
        self.response.status(status);
        self.response.end();
    }

    /// The request as template data, used when no model is bound.
    pub fn to_value(&self) -> Value {
        let headers: Map<String, Value> = self
            .request
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), Value::from(v)))
            })
            .collect();

        json!({
            "method": self.request.method.as_str(),
            "url": self.request.original_url,
            "path": self.request.path,
            "hostname": self.request.hostname,
            "query": self.request.query,
            "params": self.request.params,
            "headers": headers,
            "locals": self.request.locals().map(|l| l.0.clone()).unwrap_or_default(),
        })
    }

    pub fn into_response(self) -> Response {
        if self.passed {
            return unmatched_response();
        }
        self.response.into_response()
    }
}

fn strip_port(host: &str) -> String {
    let host = if host.starts_with('[') {
        host.split(']').next().map(|h| &h[1..]).unwrap_or(host)
    } else {
        host.split(':').next().unwrap_or(host)
    };
    host.to_ascii_lowercase()
}

/// Parses a query string; repeated keys collect into arrays.
pub(crate) fn parse_query(query: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppMetadata;

    fn exchange(uri: &str, accept: Option<&str>) -> Exchange {
        let mut builder = Request::builder().uri(uri).header("host", "Example.com:8080");
        if let Some(accept) = accept {
            builder = builder.header("accept", accept);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        let responder = Responder::new(Arc::new(AppMetadata {
            name: "demo".into(),
            version: "1.0.0".into(),
            description: String::new(),
        }))
        .with_headers(vec![("test".into(), "1".into())]);
        Exchange::new(parts, Bytes::new(), BTreeMap::new(), Arc::new(responder))
    }

    fn body_json(ex: &Exchange) -> Value {
        serde_json::from_slice(ex.response.body().unwrap()).unwrap()
    }

    #[test]
    fn test_request_fields() {
        let ex = exchange("/apis/express?x=1&x=2&y=3", None);
        assert_eq!(ex.request.path, "/apis/express");
        assert_eq!(ex.request.original_url, "/apis/express?x=1&x=2&y=3");
        assert_eq!(ex.request.hostname, "example.com");
        assert_eq!(ex.request.query["x"], json!(["1", "2"]));
        assert_eq!(ex.request.query["y"], json!("3"));
    }

    #[test]
    fn test_every_catalog_error_sets_status_and_body() {
        for kind in ErrorKind::ALL {
            let mut ex = exchange("/", None);
            ex.error(*kind, None);
            assert_eq!(ex.response.status_code().as_u16(), kind.code());
            assert_eq!(
                body_json(&ex),
                json!({"error": kind.reason(), "status": kind.code()})
            );
        }
    }

    #[test]
    fn test_error_decorates_response() {
        let mut ex = exchange("/", None);
        ex.not_found_error();
        let headers = ex.response.headers();
        assert_eq!(headers["x-version-requested"], "latest");
        assert_eq!(headers["x-name"], "demo");
        assert_eq!(headers["x-version"], "1.0.0");
        assert_eq!(headers["x-test"], "1");
        assert!(headers.get("x-description").is_none());
    }

    #[test]
    fn test_error_with_structured_message() {
        let mut ex = exchange("/", None);
        ex.error(ErrorKind::InvalidParameter, Some(json!({"field": "name"})));
        assert_eq!(ex.response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(&ex), json!({"field": "name"}));
    }

    #[test]
    fn test_status_is_not_downgraded_to_ok() {
        let mut ex = exchange("/", None);
        ex.response.status(StatusCode::NOT_FOUND);
        ex.response.status(StatusCode::OK);
        assert_eq!(ex.response.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_first_send_wins() {
        let mut ex = exchange("/", None);
        ex.send_data(json!({"success": true}));
        ex.internal_server_error();
        ex.response.send("later");
        assert_eq!(ex.response.status_code(), StatusCode::OK);
        assert_eq!(body_json(&ex), json!({"success": true}));
    }

    #[test]
    fn test_error_by_name() {
        let mut ex = exchange("/", None);
        ex.error_by_name("tooManyRequestsError");
        assert_eq!(ex.response.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let mut ex = exchange("/", None);
        ex.error_by_name("noSuchError");
        assert_eq!(ex.response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_carries_status_headers_and_body() {
        let mut ex = exchange("/", None);
        ex.not_found_error();
        let response = ex.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-test"], "1");
        assert!(response.extensions().get::<Unmatched>().is_none());
    }

    #[test]
    fn test_pass_marks_response_unmatched() {
        let mut ex = exchange("/", None);
        ex.pass();
        let response = ex.into_response();
        assert!(response.extensions().get::<Unmatched>().is_some());
    }

    #[test]
    fn test_to_value_includes_locals() {
        let mut request = Request::builder().uri("/page?q=1").body(Body::empty()).unwrap();
        Locals::set(&mut request, "client", "some client");
        let (parts, _) = request.into_parts();
        let ex = Exchange::new(parts, Bytes::new(), BTreeMap::new(), Arc::new(Responder::default()));

        let value = ex.to_value();
        assert_eq!(value["locals"]["client"], "some client");
        assert_eq!(value["query"]["q"], "1");
        assert_eq!(value["path"], "/page");
    }
}

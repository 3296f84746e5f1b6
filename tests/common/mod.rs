//! Shared fixtures and handlers for integration tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use axum::Router;
use convention_mvc::{
    middleware_fn, model_factory, Args, Controller, Exchange, HandlerError, HandlerResult, Manifest,
    Model, MvcConfig, RequestHandler, ResourceApi, RouteOptions, View,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Absolute path of a project tree under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Default config with `root` as the project root.
#[allow(dead_code)]
pub fn config_for(root: &Path) -> MvcConfig {
    let mut config = MvcConfig::default();
    config.project.root = root.to_path_buf();
    config
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Sends one request through `router`.
#[allow(dead_code)]
pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Handlers of `tests/fixtures/root`.
#[allow(dead_code)]
pub fn root_manifest() -> Manifest {
    Manifest::new()
        .api("apis/ExpressApi", ExpressApi)
        .api("apis/SecondExpressApi", SecondExpressApi)
        .api("apis/SomeMiddlewareApi", SomeMiddlewareApi)
        .controller("MyController", MyController)
        .controller("bad/BadController", BadController)
        .model("MyModel", model_factory(|_| MyModel))
}

/// Handlers of `tests/fixtures/root2`.
#[allow(dead_code)]
pub fn root2_manifest() -> Manifest {
    Manifest::new()
        .api("apis/ExpressApi", AlternateExpressApi)
        .api("apis/ParameterApi", ParameterApi)
        .api("apis/ThirdApi", ThirdApi)
        .controller("anotherContext/AnotherContextController", ErrorController)
}

/// Handlers of `tests/fixtures/root3`.
#[allow(dead_code)]
pub fn root3_manifest() -> Manifest {
    Manifest::new().api("otherApis/ThirdExpressApi", ThirdExpressApi)
}

pub struct ExpressApi;

impl RequestHandler for ExpressApi {
    fn routes(&self) -> RouteOptions {
        RouteOptions::new().with_header("test", "1")
    }
}

#[async_trait]
impl ResourceApi for ExpressApi {
    async fn do_get(&self, _ex: &mut Exchange, _args: Args) -> HandlerResult {
        Ok(Some(json!({ "success": true })))
    }

    async fn do_put(&self, _ex: &mut Exchange, args: Args) -> HandlerResult {
        Ok(Some(json!({ "data": args.value(0) })))
    }
}

pub struct SecondExpressApi;

impl RequestHandler for SecondExpressApi {}

#[async_trait]
impl ResourceApi for SecondExpressApi {
    async fn do_get(&self, _ex: &mut Exchange, _args: Args) -> HandlerResult {
        Ok(Some(json!({ "success": true })))
    }
}

/// Refuses any request carrying a query string before the handler runs.
pub struct SomeMiddlewareApi;

impl RequestHandler for SomeMiddlewareApi {
    fn routes(&self) -> RouteOptions {
        RouteOptions::new().with_middleware(middleware_fn(|request: Request<Body>, next: Next| async move {
            if request.uri().query().is_some() {
                return Json(json!({ "success": false })).into_response();
            }
            next.run(request).await
        }))
    }
}

#[async_trait]
impl ResourceApi for SomeMiddlewareApi {
    async fn do_get(&self, _ex: &mut Exchange, _args: Args) -> HandlerResult {
        Ok(Some(json!({ "success": true })))
    }
}

pub struct AlternateExpressApi;

impl RequestHandler for AlternateExpressApi {}

#[async_trait]
impl ResourceApi for AlternateExpressApi {
    async fn do_get(&self, _ex: &mut Exchange, _args: Args) -> HandlerResult {
        Ok(Some(json!({ "success": true, "alternate": true })))
    }
}

/// Echoes the route captures.
pub struct ParameterApi;

impl RequestHandler for ParameterApi {}

#[async_trait]
impl ResourceApi for ParameterApi {
    async fn do_get(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        Ok(Some(serde_json::to_value(&ex.request.params)?))
    }
}

/// Answers every body-less verb with its first three arguments.
pub struct ThirdApi;

impl ThirdApi {
    fn abc(args: &Args) -> HandlerResult {
        Ok(Some(json!({ "a": args.value(0), "b": args.value(1), "c": args.value(2) })))
    }
}

impl RequestHandler for ThirdApi {
    fn routes(&self) -> RouteOptions {
        RouteOptions::new().with_path_config(["a", "b", "c"])
    }
}

#[async_trait]
impl ResourceApi for ThirdApi {
    async fn do_get(&self, _ex: &mut Exchange, args: Args) -> HandlerResult {
        Self::abc(&args)
    }

    async fn do_post(&self, _ex: &mut Exchange, args: Args) -> HandlerResult {
        Self::abc(&args)
    }

    async fn do_put(&self, _ex: &mut Exchange, args: Args) -> HandlerResult {
        Self::abc(&args)
    }

    async fn do_patch(&self, _ex: &mut Exchange, args: Args) -> HandlerResult {
        Self::abc(&args)
    }

    async fn do_delete(&self, _ex: &mut Exchange, args: Args) -> HandlerResult {
        Self::abc(&args)
    }
}

pub struct ThirdExpressApi;

impl RequestHandler for ThirdExpressApi {}

#[async_trait]
impl ResourceApi for ThirdExpressApi {
    async fn do_get(&self, _ex: &mut Exchange, _args: Args) -> HandlerResult {
        Ok(Some(json!({ "success": true })))
    }

    async fn do_post(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        ex.response.status(StatusCode::OK).send("done");
        Ok(None)
    }
}

/// Responds with the error named by `?getError=`, or renders its view.
async fn error_or_render(ex: &mut Exchange, view: &View) {
    let requested = ex
        .request
        .query
        .get("getError")
        .and_then(Value::as_str)
        .map(str::to_owned);
    match requested.as_deref() {
        Some("not-found") => ex.not_found_error(),
        Some("server-error") => ex.internal_server_error(),
        Some("unauthorized") => ex.unauthorized_error(),
        Some("wrong-accept") => ex.wrong_accept_error(),
        _ => view.send(ex).await,
    }
}

pub struct MyController;

impl RequestHandler for MyController {}

#[async_trait]
impl Controller for MyController {
    async fn do_get(&self, ex: &mut Exchange, _args: Args, view: &View) -> HandlerResult {
        error_or_render(ex, view).await;
        Ok(None)
    }
}

pub struct ErrorController;

impl RequestHandler for ErrorController {}

#[async_trait]
impl Controller for ErrorController {
    async fn do_get(&self, ex: &mut Exchange, _args: Args, view: &View) -> HandlerResult {
        error_or_render(ex, view).await;
        Ok(None)
    }
}

pub struct BadController;

#[async_trait]
impl RequestHandler for BadController {
    async fn is_request_ok(&self, _ex: &Exchange) -> bool {
        false
    }
}

impl Controller for BadController {}

pub struct MyModel;

#[async_trait]
impl Model for MyModel {
    async fn data(&self, _ex: &Exchange) -> Result<Value, HandlerError> {
        Ok(json!({ "title": "Hello World" }))
    }
}

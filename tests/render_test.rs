//! Controllers rendering views through models, config, assets and layouts.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::Router;
use common::*;
use convention_mvc::config::RunMode;
use convention_mvc::{middleware_fn, Application, Locals, Manifest, MvcConfig};
use serde_json::json;

async fn bound(name: &str, manifest: Manifest, config: MvcConfig) -> Router {
    let mut app = Application::new(&config);
    app.bind(fixture(name), manifest).await.unwrap();
    app.into_router()
}

async fn root_router() -> Router {
    bound("root", root_manifest(), config_for(&fixture("root"))).await
}

fn html_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("accept", "text/html")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_view_renders_model_config_and_assets() {
    let router = root_router().await;

    let response = send(&router, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");

    let html = body_text(response).await;
    assert!(html.contains("<title>Default Layout</title>"), "{html}");
    assert!(html.contains("<h1>Hello World</h1>"), "{html}");
    assert!(html.contains("My little elephant"), "{html}");
    assert!(html.contains(r#"<link rel="stylesheet" href="/__vendor/someDependency.css">"#), "{html}");
    assert!(html.contains(r#"<link rel="stylesheet" href="/MyAssets/my.css">"#), "{html}");
    assert!(html.contains(r#"<script src="/__vendor/someDependency.js"></script>"#), "{html}");
    assert!(html.contains(r#"<script src="/MyAssets/my.js"></script>"#), "{html}");
    assert!(!html.contains("my.min.css"), "{html}");
}

#[tokio::test]
async fn test_production_mode_prefers_minified_assets() {
    let root = fixture("root");
    let mut config = config_for(&root);
    config.project.mode = RunMode::Production;
    let router = bound("root", root_manifest(), config).await;

    let html = body_text(send(&router, get("/")).await).await;
    assert!(html.contains("Minified elephant"), "{html}");
    assert!(html.contains(r#"href="/MyAssets/my.min.css""#), "{html}");
    assert!(!html.contains(r#"href="/MyAssets/my.css""#), "{html}");
    assert!(html.contains(r#"src="/MyAssets/my.js""#), "{html}");
}

#[tokio::test]
async fn test_nested_layouts() {
    let router = root_router().await;

    for (uri, text) in [("/contextA", "Context A"), ("/contextB/", "Context B")] {
        let response = send(&router, get(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let html = body_text(response).await;
        assert!(html.contains("<title>Default Layout</title>"), "{html}");
        assert!(html.contains("<h2>Extended Headline</h2>"), "{html}");
        assert!(html.contains(text), "{html}");
    }
}

#[tokio::test]
async fn test_layout_cycle_is_reported_in_body() {
    let router = root_router().await;

    let response = send(&router, get("/loop")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("layout cycle detected"), "{html}");
}

#[tokio::test]
async fn test_controller_assets_are_served() {
    let router = root_router().await;

    let response = send(&router, get("/MyAssets/someDir/test.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "some": "json" }));

    let response = send(&router, get("/MyAssets/missing.css")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Not Found", "status": 404 })
    );
}

#[tokio::test]
async fn test_missing_controller_asset_directory_is_404() {
    let router = root_router().await;

    let response = send(&router, get("/contextA/ContextAAssets/app.js")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Not Found", "status": 404 })
    );
}

#[tokio::test]
async fn test_model_json() {
    let router = root_router().await;

    let response = send(&router, get("/model.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let model = body_json(response).await;
    assert_eq!(model["title"], "Hello World");
    assert_eq!(model["config"]["tagline"], "My little elephant");
    let css = model["assets"]["css"].as_array().unwrap();
    assert!(css.contains(&json!("/MyAssets/my.css")), "{model}");

    let response = send(&router, get("/contextA/model.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["path"], "/contextA/model.json");
}

#[tokio::test]
async fn test_controller_errors_without_pages_are_json() {
    let router = root_router().await;

    let response = send(&router, get("/?getError=not-found")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Not Found", "status": 404 })
    );

    let response = send(&router, get("/?getError=unauthorized")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failed_precheck_is_400() {
    let router = root_router().await;

    let response = send(&router, get("/bad")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Bad Request", "status": 400 })
    );
}

#[tokio::test]
async fn test_error_pages_for_html_clients() {
    let root = fixture("root2");
    let router = bound("root2", root2_manifest(), config_for(&root)).await;

    let response = send(&router, html_get("/anotherContext?getError=server-error")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await.trim(), "Custom 500 error");

    let response = send(&router, html_get("/anotherContext?getError=not-found")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await.trim(), "404");

    let response = send(&router, html_get("/anotherContext?getError=wrong-accept")).await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body_text(response).await.trim(), "406");

    let response = send(&router, get("/anotherContext?getError=server-error")).await;
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal Server Error", "status": 500 })
    );

    let response = send(&router, html_get("/anotherContext")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Another context"));
}

#[tokio::test]
async fn test_application_middleware_sets_locals() {
    let root = fixture("root");
    let mut app = Application::new(&config_for(&root)).with_middleware(middleware_fn(
        |mut request: Request<Body>, next: Next| async move {
            Locals::set(&mut request, "client", "integration");
            next.run(request).await
        },
    ));
    app.bind(&root, root_manifest()).await.unwrap();
    let router = app.into_router();

    let html = body_text(send(&router, get("/")).await).await;
    assert!(html.contains(r#"<p class="client">integration</p>"#), "{html}");
}

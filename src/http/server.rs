//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the application router in the shared middleware stack
//!   (request id, tracing, timeout, body limit)
//! - Serve on a bound listener until shutdown is signalled

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::MvcConfig;

/// HTTP server for a bound application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(app: Router, config: &MvcConfig) -> Self {
        Self {
            router: Self::build_router(app, config),
        }
    }

    /// Layers run outside-in: request id, tracing, timeout, body limit.
    #[allow(deprecated)]
    fn build_router(app: Router, config: &MvcConfig) -> Router {
        app.layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serves until `shutdown` fires, then drains in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let server = HttpServer::new(Router::new().route("/", get(|| async { "ok" })), &MvcConfig::default());
        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut config = MvcConfig::default();
        config.limits.max_body_bytes = 4;
        let app = Router::new().route("/", axum::routing::post(|body: String| async move { body }));
        let response = HttpServer::new(app, &config)
            .router()
            .oneshot(Request::post("/").body(Body::from("too long")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}

use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use core_config::server::ServerConfig;
use domain_pricing::handlers::ApiDoc;
use serde_json::json;
use std::future::{Future, IntoFuture};
use std::io;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};
use utoipa::OpenApi;

use crate::config::{Config, CorsConfig};
use crate::health::health_router;
use crate::shutdown::shutdown_signal;
use crate::spa;

/// Upper bound on draining in-flight requests once shutdown starts
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Assemble the application router.
///
/// - `api` nested under `/api`, with CORS and a JSON 404 fallback
/// - OpenAPI document at `/api-docs/openapi.json`
/// - `/health` liveness endpoint
/// - everything else served by the single-page application
pub fn create_router(api: Router, config: &Config) -> Router {
    let api = api.fallback(api_not_found).layer(cors_layer(&config.cors));

    Router::new()
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        .merge(health_router(config.app))
        .fallback_service(spa::router(config.web_dir.clone()))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// CORS layer for the API routes
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = match &cors.allowed_origins {
        Some(origins) => AllowOrigin::list(origins.clone()),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(cors.allowed_methods.clone())
        .allow_headers(cors.allowed_headers.clone())
        .max_age(Duration::from_secs(86400))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![utoipa::openapi::Server::new("/api")]);
    Json(doc)
}

async fn api_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": format!("No route for {}", uri.path()),
            "code": StatusCode::NOT_FOUND.as_u16()
        })),
    )
}

/// Bind to the configured address and serve until SIGINT/SIGTERM.
pub async fn serve(router: Router, server_config: &ServerConfig, drain_timeout: Duration) -> io::Result<()> {
    let listener = TcpListener::bind(server_config.address()).await?;
    info!(address = %listener.local_addr()?, "Server starting");

    serve_with_shutdown(listener, router, shutdown_signal(), drain_timeout).await
}

/// Serve on `listener` until `signal` completes.
///
/// Once signalled, the listener stops accepting and in-flight requests get
/// `drain_timeout` to finish before the server returns anyway.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
    drain_timeout: Duration,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            signal.await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let drain_deadline = async move {
        if signalled_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.inspect_err(|e| error!(error = ?e, "Server encountered an error"))
        }
        _ = drain_deadline => {
            warn!(timeout = ?drain_timeout, "In-flight requests did not finish in time, forcing shutdown");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogConfig, Environment};
    use axum::body::Body;
    use axum::http::{header, HeaderValue, Method, Request};
    use core_config::app_info;
    use domain_pricing::{
        handlers, Flavor, InMemoryEstimationRepository, Instance, PricingService, StaticCatalog,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::path::Path;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    fn test_config(web_dir: &Path) -> Config {
        Config {
            app: app_info!(),
            environment: Environment::Development,
            server: ServerConfig::new("127.0.0.1".to_string(), 0),
            catalog: CatalogConfig {
                api_url: "http://localhost:0/v4".to_string(),
                timeout: Duration::from_secs(1),
                default_zone: "par".to_string(),
            },
            cors: CorsConfig {
                allowed_origins: Some(vec![HeaderValue::from_static("http://localhost:5173")]),
                allowed_methods: vec![Method::GET, Method::POST, Method::DELETE, Method::OPTIONS],
                allowed_headers: vec![header::CONTENT_TYPE],
            },
            web_dir: web_dir.to_path_buf(),
        }
    }

    fn test_app(web_dir: &Path) -> Router {
        let catalog = StaticCatalog::new().with_zone(
            "par",
            vec![Instance::new("node", "Node.js", "20").with_flavor(Flavor::new("pico", 256, 1, 0.02, true))],
        );
        let service = PricingService::new(catalog, InMemoryEstimationRepository::new());
        create_router(handlers::router(service), &test_config(web_dir))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_name_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path()).oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "pricing_calculator");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_api_is_nested_under_api_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path()).oneshot(get_request("/api/instances")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["type"], "node");
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let response = test_app(dir.path()).oneshot(get_request("/api/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_openapi_document_lists_pricing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(get_request("/api-docs/openapi.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/instances"].is_object());
        assert!(doc["paths"]["/estimations/{id}"].is_object());
        assert_eq!(doc["servers"][0]["url"], "/api");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/estimations/calculate")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = test_app(dir.path()).oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .uri("/api/instances")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = test_app(dir.path()).oneshot(request).await.unwrap();

        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_other_paths_fall_back_to_spa() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();

        let response = test_app(dir.path()).oneshot(get_request("/estimations/new")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<html>app</html>");
    }

    async fn raw_get(addr: std::net::SocketAddr, path: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
        stream.write_all(request.as_bytes()).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn test_graceful_shutdown_stops_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let router = Router::new().route("/ping", get(|| async { "pong" }));
        let server = tokio::spawn(serve_with_shutdown(
            listener,
            router,
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_secs(5),
        ));

        let mut stream = raw_get(addr, "/ping").await;
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("pong"));

        stop_tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(result.unwrap().unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_drain_is_bounded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (started_tx, started_rx) = tokio::sync::mpsc::channel::<()>(1);

        let router = Router::new().route(
            "/slow",
            get(move || {
                let started_tx = started_tx.clone();
                async move {
                    let _ = started_tx.send(()).await;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "done"
                }
            }),
        );
        let server = tokio::spawn(serve_with_shutdown(
            listener,
            router,
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_millis(100),
        ));

        let _stream = raw_get(addr, "/slow").await;
        let mut started_rx = started_rx;
        started_rx.recv().await.unwrap();

        stop_tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(result.expect("drain timeout was not enforced").unwrap().is_ok());
    }
}

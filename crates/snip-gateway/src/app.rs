use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{check_handler, health_handler, redirect_handler, shorten_handler};
use crate::state::AppState;

/// Largest accepted request body, in bytes.
pub const MAX_BODY_BYTES: usize = 2048;

/// Longest a single request may take before it is answered with 408.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long in-flight requests may keep running once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);

        Router::new()
            .route("/health", get(health_handler))
            .route("/shorten", post(shorten_handler))
            .route("/check", post(check_handler))
            .route("/{key}", get(redirect_handler))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                REQUEST_TIMEOUT,
            ))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Serves `router` until `signal` resolves, then gives in-flight
    /// requests at most `grace` to finish.
    pub async fn serve<F>(
        listener: TcpListener,
        router: Router,
        signal: F,
        grace: Duration,
    ) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (draining_tx, mut draining_rx) = watch::channel(false);

        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                signal.await;
                // The receiver lives until `serve` returns.
                let _ = draining_tx.send(true);
            })
            .into_future();

        let drain_deadline = async move {
            if draining_rx.wait_for(|draining| *draining).await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = server => {
                result?;
                info!("in-flight requests drained");
            }
            _ = drain_deadline => {
                warn!(grace = ?grace, "in-flight requests still running, stopping anyway");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GatewaySettings;
    use axum::body::{to_bytes, Body};
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, LOCATION, ORIGIN};
    use axum::http::{Request, StatusCode};
    use async_trait::async_trait;
    use axum::response::Response;
    use snip_core::{ReadRepository, Repository, ShortKey, UrlRecord};
    use snip_storage::{InMemoryRepository, InMemorySequenceRepository};
    use snip_test_infra::FlakyRepository;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio::sync::{oneshot, Notify};
    use tower::util::ServiceExt;

    const BASE_URL: &str = "https://sn.ip";

    fn settings() -> GatewaySettings {
        GatewaySettings::builder().base_url(BASE_URL).build()
    }

    /// Never answers; signals once a lookup has reached it.
    #[derive(Default)]
    struct StalledRepository {
        entered: Notify,
    }

    #[async_trait]
    impl ReadRepository for StalledRepository {
        async fn get(&self, _key: &ShortKey) -> snip_core::repository::Result<Option<String>> {
            self.entered.notify_one();
            std::future::pending().await
        }
    }

    #[async_trait]
    impl Repository for StalledRepository {
        async fn insert(&self, _record: &UrlRecord) -> snip_core::repository::Result<()> {
            std::future::pending().await
        }
    }

    fn stalled_app(store: Arc<StalledRepository>) -> Router {
        let settings = GatewaySettings::builder()
            .base_url(BASE_URL)
            .store_timeout(Duration::from_secs(60))
            .build();
        App::router(AppState::with_random_keys(store, 6, &settings))
    }

    fn random_app() -> Router {
        App::router(AppState::with_random_keys(
            InMemoryRepository::new(),
            6,
            &settings(),
        ))
    }

    fn sequential_app() -> Router {
        App::router(AppState::with_sequential_keys(
            InMemorySequenceRepository::new(),
            &settings(),
        ))
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "text/plain")
            .body(body.into())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn shorten(app: &Router, url: &str) -> String {
        let response = app.clone().oneshot(post("/shorten", url.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        text(response).await
    }

    #[tokio::test]
    async fn shorten_then_redirect() {
        let app = random_app();

        let link = shorten(&app, "https://example.com/path").await;
        let key = link
            .strip_prefix("https://sn.ip/")
            .expect("link should use the base url");
        assert_eq!(key.len(), 6);

        let response = app.clone().oneshot(get(&format!("/{key}"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://example.com/path"
        );
    }

    #[tokio::test]
    async fn shorten_trims_surrounding_whitespace() {
        let app = random_app();

        let link = shorten(&app, "  https://example.com\n").await;
        let response = app
            .clone()
            .oneshot(post("/check", link))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "https://example.com");
    }

    #[tokio::test]
    async fn shorten_rejects_invalid_url() {
        let app = random_app();

        let response = app.oneshot(post("/shorten", "not-a-url")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(text(response).await.starts_with("Invalid URL"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = random_app();
        let url = format!("https://example.com/{}", "a".repeat(MAX_BODY_BYTES));

        let response = app.oneshot(post("/shorten", url)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unknown_and_malformed_keys_are_not_found() {
        let app = random_app();

        for uri in ["/zzzzzz", "/ab", "/abc123"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn check_rejects_foreign_links() {
        let app = random_app();

        let response = app
            .oneshot(post("/check", "https://bit.ly/abcDEF"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn check_reports_unknown_own_key() {
        let app = random_app();

        let response = app
            .oneshot(post("/check", "https://sn.ip/zzzzzz"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sequential_links_are_stable() {
        let app = sequential_app();

        let a = shorten(&app, "https://a.com").await;
        let b = shorten(&app, "https://b.com").await;
        let a_again = shorten(&app, "https://a.com").await;

        assert_eq!(a, "https://sn.ip/1");
        assert_eq!(b, "https://sn.ip/2");
        assert_eq!(a_again, a);

        let response = app.clone().oneshot(get("/2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "https://b.com");
    }

    #[tokio::test]
    async fn health_reports_store_reachability() {
        let store = Arc::new(FlakyRepository::new(InMemoryRepository::new()));
        let app = App::router(AppState::with_random_keys(
            Arc::clone(&store),
            6,
            &settings(),
        ));

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "OK");

        store.set_failing(true);
        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn storage_failures_are_internal_errors() {
        let store = Arc::new(FlakyRepository::failing(InMemoryRepository::new()));
        let app = App::router(AppState::with_random_keys(
            Arc::clone(&store),
            6,
            &settings(),
        ));

        let response = app
            .clone()
            .oneshot(post("/shorten", "https://example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app.clone().oneshot(get("/abcDEF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = random_app();

        let request = Request::builder()
            .uri("/health")
            .header(ORIGIN, "https://elsewhere.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_requests_time_out() {
        let app = stalled_app(Arc::default());

        let response = app.oneshot(get("/abcDEF")).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn shutdown_does_not_wait_for_stalled_requests() {
        let store = Arc::new(StalledRepository::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(App::serve(
            listener,
            stalled_app(Arc::clone(&store)),
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_millis(100),
        ));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /abcDEF HTTP/1.1\r\nHost: sn.ip\r\n\r\n")
            .await
            .unwrap();
        store.entered.notified().await;

        stop_tx.send(()).unwrap();
        let stopped = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop before the request times out");
        stopped.unwrap().unwrap();
        drop(client);
    }
}

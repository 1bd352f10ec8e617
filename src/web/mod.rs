//! HTTP surface: the quote API, generated image serving and the index page.

use std::num::NonZeroU16;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::pipeline::{Pipeline, PipelineFailure, Poster, QuoteMode, pick_topic};

mod images;
mod views;

use images::static_file_handler;
use views::index_handler;

#[derive(Clone)]
pub(crate) struct AppState {
    pipeline: Arc<Pipeline>,
    output_dir: PathBuf,
}

impl AppState {
    fn new(pipeline: Arc<Pipeline>, output_dir: &Path) -> Self {
        Self {
            pipeline,
            output_dir: output_dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuoteQuery {
    topic: Option<String>,
    mode: Option<QuoteMode>,
}

/// handles GET /api/quote
async fn quote_handler(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Poster>, PipelineFailure> {
    let topic = pick_topic(query.topic.as_deref());
    let mode = query.mode.unwrap_or_default();
    info!("Generating poster for topic {topic} ({mode:?})");
    state.pipeline.run(&topic, mode).await.map(Json)
}

async fn healthz_handler() -> &'static str {
    "OK"
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/quote", get(quote_handler))
        .route("/static/{filename}", get(static_file_handler))
        .route("/healthz", get(healthz_handler))
}

/// Serves the app until the listener fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: Pipeline,
    output_dir: &Path,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(AppState::new(Arc::new(pipeline), output_dir));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::background::{BackgroundProvider, FluxBackgroundProvider};
    use crate::overlay::Compositor;
    use crate::overlay::font::FontFace;
    use crate::publisher::NullPublisher;
    use crate::testing::{FakeBackground, FakeQuotes, png_bytes, read_dir_names};

    const COFFEE: &str = "Coffee: liquid courage for people with caffeinated regrets.";

    fn app_with(dir: &Path, quotes: FakeQuotes, background: Arc<dyn BackgroundProvider>) -> Router {
        let pipeline = Pipeline::new(
            Arc::new(quotes),
            background,
            Arc::new(Compositor::new(FontFace::Bitmap, dir)),
            Arc::new(NullPublisher),
        );
        create_router().with_state(AppState::new(Arc::new(pipeline), dir))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn coffee_poster_is_served_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            Arc::new(FakeBackground::ok(dir.path())),
        );

        let response = app
            .clone()
            .oneshot(get_request("/api/quote?topic=coffee"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["quote"], COFFEE);
        let img_url = body["img_url"].as_str().expect("img_url").to_string();
        assert!(img_url.starts_with("/static/"));
        assert!(img_url.ends_with(".png"));

        let response = app.oneshot(get_request(&img_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/png");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let poster = image::load_from_memory(&bytes).expect("decode poster");
        assert_eq!((poster.width(), poster.height()), (1080, 1350));
    }

    #[tokio::test]
    async fn quote_failure_is_server_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(
            dir.path(),
            FakeQuotes::failing(),
            Arc::new(FakeBackground::ok(dir.path())),
        );
        let response = app.oneshot(get_request("/api/quote")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["error"].as_str().is_some());
        assert!(body.get("quote").is_none());
    }

    #[tokio::test]
    async fn malformed_background_returns_quote_and_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": [{}]})))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = FluxBackgroundProvider::new(
            reqwest::Client::new(),
            Url::parse(&server.uri()).expect("endpoint"),
            "key",
            "model",
            dir.path(),
        );
        let app = app_with(dir.path(), FakeQuotes::ok(COFFEE), Arc::new(provider));

        let response = app
            .oneshot(get_request("/api/quote?topic=coffee"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = read_json(response).await;
        assert_eq!(body["quote"], COFFEE);
        assert!(body["error"].as_str().is_some());
        assert!(read_dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            Arc::new(FakeBackground::ok(dir.path())),
        );
        let response = app
            .oneshot(get_request("/api/quote?mode=shouting"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn static_files_are_cached_and_confined() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("123-abc.png"), png_bytes(2, 2, [1, 2, 3]))
            .expect("write file");
        let app = app_with(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            Arc::new(FakeBackground::ok(dir.path())),
        );

        let response = app
            .clone()
            .oneshot(get_request("/static/123-abc.png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let etag = response.headers().get(ETAG).unwrap().clone();

        let request = Request::builder()
            .uri("/static/123-abc.png")
            .header(IF_NONE_MATCH, etag)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        for uri in ["/static/missing.png", "/static/..%2Fsecret", "/static/.hidden"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn index_and_health() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app_with(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            Arc::new(FakeBackground::ok(dir.path())),
        );
        let response = app.clone().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8_lossy(&bytes);
        assert!(html.contains("generate-form"));
        assert!(html.contains("procrastination"));

        let response = app.oneshot(get_request("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

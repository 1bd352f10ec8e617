//! Runs quote -> background -> overlay -> publish for a single request.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::response::IntoResponse;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::background::BackgroundProvider;
use crate::constants::EXAMPLE_TOPICS;
use crate::error::PosterError;
use crate::files::local_reference;
use crate::overlay::Compositor;
use crate::publisher::Publisher;
use crate::quote::{QuoteRequest, QuoteSource};

/// How the quote is generated.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteMode {
    /// About the requested topic
    #[default]
    Topic,
    /// Brand new, steered by reference quotes
    Inspired,
}

/// A finished poster.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Poster {
    /// The generated quote
    pub quote: String,
    /// Public URL, or the `/static/` path of the local file
    pub img_url: String,
}

/// A failed run, with the quote when it was already generated.
#[derive(Debug)]
pub struct PipelineFailure {
    /// What went wrong
    pub error: PosterError,
    /// Present once the quote stage has succeeded
    pub quote: Option<String>,
}

impl IntoResponse for PipelineFailure {
    fn into_response(self) -> axum::response::Response {
        let status = self.error.status_code();
        if self.error.is_background_failure() {
            warn!("Background stage failed, returning the quote alone: {}", self.error);
        } else {
            error!("Poster generation failed: {}", self.error);
        }
        let body = match self.quote {
            Some(quote) => json!({"error": self.error.to_string(), "quote": quote}),
            None => json!({"error": self.error.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

/// Uses the requested topic, or a random example topic when it's missing or blank.
pub fn pick_topic(requested: Option<&str>) -> String {
    if let Some(topic) = requested.map(str::trim).filter(|topic| !topic.is_empty()) {
        return topic.to_string();
    }
    EXAMPLE_TOPICS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

/// The explicitly wired stages of poster generation.
pub struct Pipeline {
    quotes: Arc<dyn QuoteSource>,
    backgrounds: Arc<dyn BackgroundProvider>,
    compositor: Arc<Compositor>,
    publisher: Arc<dyn Publisher>,
}

impl Pipeline {
    /// Wires the stages together.
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        backgrounds: Arc<dyn BackgroundProvider>,
        compositor: Arc<Compositor>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            quotes,
            backgrounds,
            compositor,
            publisher,
        }
    }

    /// Generates one poster. Stages run in order, once each; publishing never fails the run.
    pub async fn run(&self, topic: &str, mode: QuoteMode) -> Result<Poster, PipelineFailure> {
        let request = match mode {
            QuoteMode::Topic => QuoteRequest::Topic(topic),
            QuoteMode::Inspired => QuoteRequest::Inspired,
        };
        let quote = self
            .quotes
            .generate_quote(request)
            .await
            .map_err(|error| PipelineFailure { error, quote: None })?;

        let fail_with_quote = |error: PosterError| PipelineFailure {
            error,
            quote: Some(quote.clone()),
        };

        let background = self
            .backgrounds
            .generate_background(topic)
            .await
            .map_err(fail_with_quote)?;

        let poster_path = self
            .compose(background, quote.clone())
            .await
            .map_err(fail_with_quote)?;

        let img_url = match self.publisher.publish(&quote, &poster_path).await {
            Ok(Some(url)) => url,
            Ok(None) => local_reference(&poster_path),
            Err(err) => {
                warn!("Publishing failed, serving locally: {err}");
                local_reference(&poster_path)
            }
        };
        info!("Poster ready for topic {topic}: {img_url}");
        Ok(Poster { quote, img_url })
    }

    async fn compose(&self, background: PathBuf, quote: String) -> Result<PathBuf, PosterError> {
        let compositor = Arc::clone(&self.compositor);
        tokio::task::spawn_blocking(move || compositor.overlay(&background, &quote))
            .await
            .map_err(|err| PosterError::Composition(format!("render task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::font::FontFace;
    use crate::publisher::NullPublisher;
    use crate::testing::{
        FailingPublisher, FakeBackground, FakeQuotes, FixedPublisher, read_dir_names,
    };
    use std::path::Path;

    const COFFEE: &str = "Coffee: liquid courage for people with caffeinated regrets.";

    fn pipeline(
        dir: &Path,
        quotes: FakeQuotes,
        background: FakeBackground,
        publisher: Arc<dyn Publisher>,
    ) -> Pipeline {
        Pipeline::new(
            Arc::new(quotes),
            Arc::new(background),
            Arc::new(Compositor::new(FontFace::Bitmap, dir)),
            publisher,
        )
    }

    #[test]
    fn blank_topics_get_an_example() {
        for requested in [None, Some(""), Some("   ")] {
            let topic = pick_topic(requested);
            assert!(EXAMPLE_TOPICS.contains(&topic.as_str()));
        }
        assert_eq!(pick_topic(Some("  coffee ")), "coffee");

        let picked: std::collections::HashSet<String> =
            (0..200).map(|_| pick_topic(None)).collect();
        assert!(picked.len() > 1);
    }

    #[tokio::test]
    async fn coffee_end_to_end_without_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let quotes = FakeQuotes::ok(COFFEE);
        let seen = quotes.seen.clone();
        let pipeline = pipeline(
            dir.path(),
            quotes,
            FakeBackground::ok(dir.path()),
            Arc::new(NullPublisher),
        );

        let poster = pipeline
            .run("coffee", QuoteMode::Topic)
            .await
            .expect("poster");
        assert_eq!(poster.quote, COFFEE);
        assert!(poster.img_url.starts_with("/static/"));
        assert!(poster.img_url.ends_with(".png"));
        assert_eq!(
            seen.lock().expect("lock").as_slice(),
            &["topic:coffee".to_string()]
        );

        let name = poster.img_url.trim_start_matches("/static/");
        let composed = image::open(dir.path().join(name)).expect("decode poster");
        assert_eq!(composed.width(), 1080);
        assert_eq!(composed.height(), 1350);
    }

    #[tokio::test]
    async fn inspired_mode_is_forwarded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let quotes = FakeQuotes::ok("Dream big, nap often.");
        let seen = quotes.seen.clone();
        let pipeline = pipeline(
            dir.path(),
            quotes,
            FakeBackground::ok(dir.path()),
            Arc::new(NullPublisher),
        );
        pipeline
            .run("sleep", QuoteMode::Inspired)
            .await
            .expect("poster");
        assert_eq!(
            seen.lock().expect("lock").as_slice(),
            &["inspired".to_string()]
        );
    }

    #[tokio::test]
    async fn quote_failure_has_no_quote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = pipeline(
            dir.path(),
            FakeQuotes::failing(),
            FakeBackground::ok(dir.path()),
            Arc::new(NullPublisher),
        );
        let failure = pipeline
            .run("work", QuoteMode::Topic)
            .await
            .expect_err("should fail");
        assert!(matches!(failure.error, PosterError::QuoteGeneration(_)));
        assert!(failure.quote.is_none());
        assert!(read_dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn background_failure_keeps_quote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = pipeline(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            FakeBackground::malformed(),
            Arc::new(NullPublisher),
        );
        let failure = pipeline
            .run("coffee", QuoteMode::Topic)
            .await
            .expect_err("should fail");
        assert!(matches!(
            failure.error,
            PosterError::MalformedProviderResponse(_)
        ));
        assert_eq!(failure.quote.as_deref(), Some(COFFEE));
        assert!(read_dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn published_url_is_returned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = pipeline(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            FakeBackground::ok(dir.path()),
            Arc::new(FixedPublisher("https://cdn.example.org/poster.png".to_string())),
        );
        let poster = pipeline
            .run("coffee", QuoteMode::Topic)
            .await
            .expect("poster");
        assert_eq!(poster.img_url, "https://cdn.example.org/poster.png");
    }

    #[tokio::test]
    async fn publish_failure_is_masked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = pipeline(
            dir.path(),
            FakeQuotes::ok(COFFEE),
            FakeBackground::ok(dir.path()),
            Arc::new(FailingPublisher),
        );
        let poster = pipeline
            .run("coffee", QuoteMode::Topic)
            .await
            .expect("poster");
        assert!(poster.img_url.starts_with("/static/"));
    }
}

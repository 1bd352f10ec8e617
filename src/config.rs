//! Config handling: logging, HTTP client and pipeline wiring

use std::path::PathBuf;
use std::sync::Arc;

use tracing::log::LevelFilter;
use tracing::{info, warn};

use crate::background::FluxBackgroundProvider;
use crate::cli::ServiceOptions;
use crate::constants::{DEFAULT_FONT_PATHS, HTTP_TIMEOUT};
use crate::corpus::ReferenceCorpus;
use crate::error::PosterError;
use crate::overlay::Compositor;
use crate::overlay::font::FontFace;
use crate::pipeline::Pipeline;
use crate::publisher::{NullPublisher, Publisher, SupabasePublisher};
use crate::quote::ChatQuoteSource;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Shared client for every outbound call, bounded by [`HTTP_TIMEOUT`].
pub fn build_http_client() -> Result<reqwest::Client, PosterError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| PosterError::Config(format!("failed to build HTTP client: {err}")))
}

/// Configured font candidates first, then the built-in list.
pub fn font_candidates(options: &ServiceOptions) -> Vec<PathBuf> {
    options
        .font_paths
        .iter()
        .cloned()
        .chain(DEFAULT_FONT_PATHS.iter().map(PathBuf::from))
        .collect()
}

/// Picks the publisher once: Supabase when both URL and key are set, otherwise a no-op.
pub async fn build_publisher(
    options: &ServiceOptions,
    client: &reqwest::Client,
) -> Arc<dyn Publisher> {
    let (Some(url), Some(key)) = (
        options.supabase_url.as_ref(),
        options.supabase_key.as_deref().filter(|key| !key.is_empty()),
    ) else {
        info!("Supabase not configured: SUPABASE_URL or SUPABASE_KEY missing, posters stay local");
        return Arc::new(NullPublisher);
    };
    let publisher = SupabasePublisher::new(client.clone(), url, key);
    if let Err(err) = publisher.ensure_bucket().await {
        warn!("Could not verify storage bucket: {err}");
    }
    Arc::new(publisher)
}

/// Builds every pipeline stage from the options and creates the output directory.
pub async fn build_pipeline(options: &ServiceOptions) -> Result<Pipeline, PosterError> {
    tokio::fs::create_dir_all(&options.output_dir)
        .await
        .map_err(|err| {
            PosterError::Config(format!(
                "failed to create output dir {}: {err}",
                options.output_dir.display()
            ))
        })?;

    let client = build_http_client()?;
    let corpus = Arc::new(ReferenceCorpus::load(&options.corpus_path));
    let quotes = ChatQuoteSource::new(
        client.clone(),
        &options.openai_base_url,
        &options.openai_api_key,
        &options.text_model,
        corpus,
    )?;
    let backgrounds = FluxBackgroundProvider::new(
        client.clone(),
        options.image_endpoint.clone(),
        &options.flux_api_key,
        &options.image_model,
        &options.output_dir,
    );
    let face = FontFace::resolve(&font_candidates(options));
    let compositor = Compositor::new(face, &options.output_dir);
    let publisher = build_publisher(options, &client).await;

    Ok(Pipeline::new(
        Arc::new(quotes),
        Arc::new(backgrounds),
        Arc::new(compositor),
        publisher,
    ))
}

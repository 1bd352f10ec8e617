//! CLI parser
use clap::{Args, Parser};
use std::num::NonZeroU16;
use std::path::PathBuf;
use url::Url;

use crate::constants::{DEFAULT_CORPUS_PATH, DEFAULT_OUTPUT_DIR};

#[derive(Args, Debug, Clone)]
/// Upstream services and storage, shared by the server and the one-shot generator
pub struct ServiceOptions {
    #[clap(long, default_value = DEFAULT_OUTPUT_DIR, env = "QUOTEPOSTER_OUTPUT_DIR")]
    /// Where backgrounds and posters are written, defaults to `./output`.
    /// Env: QUOTEPOSTER_OUTPUT_DIR
    pub output_dir: PathBuf,

    #[clap(long, default_value = DEFAULT_CORPUS_PATH, env = "QUOTEPOSTER_CORPUS_PATH")]
    /// Reference quotes, one per line. Env: QUOTEPOSTER_CORPUS_PATH
    pub corpus_path: PathBuf,

    #[clap(
        long = "font-path",
        env = "QUOTEPOSTER_FONT_PATHS",
        value_delimiter = ','
    )]
    /// Font files to try in order, before the built-in candidates.
    /// Env: QUOTEPOSTER_FONT_PATHS (comma separated)
    pub font_paths: Vec<PathBuf>,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// Key for the chat completion API. Env: OPENAI_API_KEY
    pub openai_api_key: String,

    #[clap(long, env = "OPENAI_BASE_URL")]
    /// Root of the OpenAI-compatible API, eg `https://api.openai.com/v1`.
    /// Env: OPENAI_BASE_URL
    pub openai_base_url: Url,

    #[clap(long, default_value = "gpt-4o-all", env = "QUOTEPOSTER_TEXT_MODEL")]
    /// Model used for quotes. Env: QUOTEPOSTER_TEXT_MODEL
    pub text_model: String,

    #[clap(long, env = "FLUX_API_KEY", hide_env_values = true)]
    /// Key for the image generation API. Env: FLUX_API_KEY
    pub flux_api_key: String,

    #[clap(
        long,
        default_value = "https://api.tu-zi.com/v1/images/generations",
        env = "FLUX_ENDPOINT"
    )]
    /// Image generation endpoint. Env: FLUX_ENDPOINT
    pub image_endpoint: Url,

    #[clap(long, default_value = "flux-kontext-pro", env = "QUOTEPOSTER_IMAGE_MODEL")]
    /// Model used for backgrounds. Env: QUOTEPOSTER_IMAGE_MODEL
    pub image_model: String,

    #[clap(long, env = "SUPABASE_URL")]
    /// Supabase project URL; publishing is off without it. Env: SUPABASE_URL
    pub supabase_url: Option<Url>,

    #[clap(long, env = "SUPABASE_KEY", hide_env_values = true)]
    /// Supabase service key; publishing is off without it. Env: SUPABASE_KEY
    pub supabase_key: Option<String>,
}

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "QUOTEPOSTER_DEBUG")]
    /// Enable debug logging. Env: QUOTEPOSTER_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "5001", env = "QUOTEPOSTER_PORT")]
    /// http listener, defaults to `5001`.
    /// Env: QUOTEPOSTER_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "QUOTEPOSTER_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: QUOTEPOSTER_LISTEN_ADDRESS
    pub listen_address: String,

    #[command(flatten)]
    /// Upstream services and storage
    pub service: ServiceOptions,
}

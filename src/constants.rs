//! Shared constants for the poster pipeline
//!

use std::sync::LazyLock;
use std::time::Duration;

/// The default place we put generated backgrounds and posters
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Default location of the reference quote corpus, one quote per line.
pub const DEFAULT_CORPUS_PATH: &str = "assets/quotes.txt";

/// Site-relative prefix that generated files are served under.
pub const STATIC_PREFIX: &str = "/static/";

/// Poster canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 1080;

/// Poster canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 1350;

/// Multiplier applied to every channel of the background before drawing text.
pub const BRIGHTNESS_FACTOR: f32 = 0.6;

/// Characters per line when wrapping a quote.
pub const WRAP_WIDTH: usize = 20;

/// Vertical gap between wrapped lines, in pixels.
pub const LINE_SPACING: f32 = 10.0;

/// Upper bound for every outbound HTTP call. Image generation is slow.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Aspect ratio requested from the image generator.
pub const BACKGROUND_ASPECT_RATIO: &str = "3:4";

/// How many reference quotes are shown to the model in inspired mode.
pub const STYLE_SAMPLE_SIZE: usize = 8;

/// Default font candidates, tried in order.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "assets/fonts/Inter-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

/// Topics picked from when the caller doesn't supply one.
pub const EXAMPLE_TOPICS: &[&str] = &[
    "life",
    "coffee",
    "work",
    "procrastination",
    "love",
    "success",
    "failure",
    "money",
    "sleep",
    "cats",
    "technology",
    "meeting",
    "monday",
];

/// Used when the corpus file is missing or empty.
pub const DEFAULT_REFERENCE_QUOTES: &[&str] = &[
    "Life is short; so is your attention span.",
    "Success is just failure with better PR.",
    "Dream big, nap often.",
    "The early bird gets exhausted first.",
    "Hope is the first step on the road to disappointment.",
];

/// Max age (in seconds) for generated image cache entries.
pub const IMAGE_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60 * 24;

/// Cache-Control value for generated image responses. Files never change once written.
pub static IMAGE_CACHE_CONTROL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "public, max-age={}, immutable",
        IMAGE_CACHE_MAX_AGE_SECONDS
    )
});

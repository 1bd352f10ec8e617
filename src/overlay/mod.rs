//! Composites a quote onto a background image.

pub mod font;
pub mod layout;

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::info;

use crate::constants::{BRIGHTNESS_FACTOR, CANVAS_HEIGHT, CANVAS_WIDTH, WRAP_WIDTH};
use crate::error::PosterError;
use crate::files::unique_name;
use font::{FontFace, SizedFont};
use layout::{FontTier, TextLayout, wrap};

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Renders posters into the output directory.
#[derive(Debug)]
pub struct Compositor {
    face: FontFace,
    output_dir: PathBuf,
}

/// Multiplies every channel by `factor`.
pub fn darken(canvas: &mut RgbImage, factor: f32) {
    for pixel in canvas.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

impl Compositor {
    /// `face` is resolved once at startup and reused for every poster.
    pub fn new(face: FontFace, output_dir: &Path) -> Self {
        Self {
            face,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Lays out `quote` for the poster canvas, returning the sized font it was measured with.
    pub fn layout(&self, quote: &str) -> (SizedFont<'_>, TextLayout) {
        let font = self.face.sized(FontTier::for_quote(quote).pixel_size());
        let layout =
            TextLayout::centered(&wrap(quote, WRAP_WIDTH), &font, CANVAS_WIDTH, CANVAS_HEIGHT);
        (font, layout)
    }

    /// Resizes, darkens and draws `quote` centered in white.
    pub fn render(&self, background: &DynamicImage, quote: &str) -> RgbImage {
        let mut canvas = background
            .resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3)
            .to_rgb8();
        darken(&mut canvas, BRIGHTNESS_FACTOR);

        let (font, layout) = self.layout(quote);
        for line in &layout.lines {
            font.draw_line(&mut canvas, line.x, line.y, &line.text, TEXT_COLOR);
        }
        canvas
    }

    /// Composes the poster for `background` and writes it as a new PNG.
    pub fn overlay(&self, background: &Path, quote: &str) -> Result<PathBuf, PosterError> {
        let image = image::open(background).map_err(|err| {
            PosterError::Composition(format!(
                "failed to decode background {}: {err}",
                background.display()
            ))
        })?;
        let canvas = self.render(&image, quote);
        let path = self.output_dir.join(unique_name("", ".png"));
        canvas
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|err| PosterError::Composition(format!("failed to save poster: {err}")))?;
        info!("Composed poster {}", path.display());
        Ok(path)
    }
}

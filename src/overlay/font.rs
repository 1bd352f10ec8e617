//! Font resolution and glyph rendering.
//!
//! An outline font is loaded from the first candidate path that parses. When none
//! does, text is drawn with the built-in 8x8 bitmap font, scaled up in whole pixels.

use std::path::PathBuf;

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};
use tracing::{debug, info, warn};

/// Bitmap glyph cell size, in font pixels.
const BITMAP_CELL: u32 = 8;

/// Pixel size per bitmap scale step, roughly matching the advance of an outline font.
const BITMAP_PX_PER_SCALE: f32 = 14.0;

/// A resolved typeface, independent of size.
#[derive(Clone)]
pub enum FontFace {
    /// A TrueType/OpenType font loaded from disk
    Outline(Font<'static>),
    /// The built-in bitmap font
    Bitmap,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(_) => write!(f, "FontFace::Outline"),
            Self::Bitmap => write!(f, "FontFace::Bitmap"),
        }
    }
}

impl FontFace {
    /// Uses the first candidate that exists and parses. Never fails.
    pub fn resolve(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.exists() {
                debug!("Font candidate {} does not exist", path.display());
                continue;
            }
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("Failed to read font {}: {}", path.display(), err);
                    continue;
                }
            };
            match Font::try_from_vec(bytes) {
                Some(font) => {
                    info!("Using font {}", path.display());
                    return Self::Outline(font);
                }
                None => warn!("Font {} could not be parsed", path.display()),
            }
        }
        warn!("No usable font found, falling back to the built-in bitmap font");
        Self::Bitmap
    }

    /// This face at `px` pixels.
    pub fn sized(&self, px: f32) -> SizedFont<'_> {
        SizedFont { face: self, px }
    }
}

/// A face at a specific size. Measuring and drawing go through the same metrics.
#[derive(Clone, Debug)]
pub struct SizedFont<'a> {
    face: &'a FontFace,
    px: f32,
}

/// Typographic punctuation that has a plain ASCII look-alike.
fn ascii_lookalike(ch: char) -> char {
    match ch {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
        '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
        '\u{2026}' => '.',
        other => other,
    }
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    let ch = ascii_lookalike(ch);
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn blend(dst: &mut Rgb<u8>, color: Rgb<u8>, alpha: f32) {
    let inv = 1.0 - alpha;
    for channel in 0..3 {
        dst.0[channel] =
            (color.0[channel] as f32 * alpha + dst.0[channel] as f32 * inv).round() as u8;
    }
}

impl SizedFont<'_> {
    fn bitmap_scale(&self) -> u32 {
        (self.px / BITMAP_PX_PER_SCALE).round().max(1.0) as u32
    }

    /// Height of one line, ascent to descent.
    pub fn line_height(&self) -> f32 {
        match self.face {
            FontFace::Outline(font) => {
                let metrics = font.v_metrics(Scale::uniform(self.px));
                metrics.ascent - metrics.descent
            }
            FontFace::Bitmap => (BITMAP_CELL * self.bitmap_scale()) as f32,
        }
    }

    /// Advance width of `text` on a single line.
    pub fn line_width(&self, text: &str) -> f32 {
        match self.face {
            FontFace::Outline(font) => {
                let scale = Scale::uniform(self.px);
                font.layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|glyph| {
                        glyph.position().x + glyph.unpositioned().h_metrics().advance_width
                    })
                    .unwrap_or(0.0)
            }
            // the last column of every cell is blank spacing
            FontFace::Bitmap => match text.chars().count() as u32 {
                0 => 0.0,
                count => ((count * BITMAP_CELL - 1) * self.bitmap_scale()) as f32,
            },
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`). Pixels off the canvas are skipped.
    pub fn draw_line(&self, canvas: &mut RgbImage, x: f32, y: f32, text: &str, color: Rgb<u8>) {
        match self.face {
            FontFace::Outline(font) => {
                let scale = Scale::uniform(self.px);
                let ascent = font.v_metrics(scale).ascent;
                for glyph in font.layout(text, scale, point(x, y + ascent)) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        let px = gx as i32 + bb.min.x;
                        let py = gy as i32 + bb.min.y;
                        if px < 0 || py < 0 || coverage <= 0.0 {
                            return;
                        }
                        let (px, py) = (px as u32, py as u32);
                        if px >= canvas.width() || py >= canvas.height() {
                            return;
                        }
                        blend(canvas.get_pixel_mut(px, py), color, coverage.min(1.0));
                    });
                }
            }
            FontFace::Bitmap => {
                let scale = self.bitmap_scale() as i64;
                let left = x.round() as i64;
                let top = y.round() as i64;
                let cell = BITMAP_CELL as i64 * scale;
                for (idx, ch) in text.chars().enumerate() {
                    let glyph = bitmap_glyph(ch);
                    let glyph_left = left + idx as i64 * cell;
                    for (row, bits) in glyph.iter().enumerate() {
                        for col in 0..BITMAP_CELL as i64 {
                            if bits & (1 << col) == 0 {
                                continue;
                            }
                            fill_block(
                                canvas,
                                glyph_left + col * scale,
                                top + row as i64 * scale,
                                scale,
                                color,
                            );
                        }
                    }
                }
            }
        }
    }
}

fn fill_block(canvas: &mut RgbImage, x: i64, y: i64, size: i64, color: Rgb<u8>) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    for py in y.max(0)..(y + size).min(height) {
        for px in x.max(0)..(x + size).min(width) {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

//! Text layout: wrapping, font size tiers and block centering.

use super::font::SizedFont;
use crate::constants::LINE_SPACING;

/// Discrete font sizes, picked from the longest line of the quote.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FontTier {
    /// Lines under 30 characters
    Large,
    /// Lines under 60 characters
    Medium,
    /// Everything longer
    Small,
}

impl FontTier {
    /// Tier for a line of `len` characters.
    pub fn for_line_length(len: usize) -> Self {
        if len < 30 {
            Self::Large
        } else if len < 60 {
            Self::Medium
        } else {
            Self::Small
        }
    }

    /// Tier for a quote, measured on its longest line as written.
    pub fn for_quote(quote: &str) -> Self {
        let longest = quote
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        Self::for_line_length(longest)
    }

    /// Font size in pixels.
    pub fn pixel_size(self) -> f32 {
        match self {
            Self::Large => 72.0,
            Self::Medium => 60.0,
            Self::Small => 48.0,
        }
    }
}

/// Greedy word wrap to `width` characters. Whitespace runs collapse to a single
/// space and words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        if current_len > 0 && current_len + 1 + chars.len() <= width {
            current.push(' ');
            current.extend(chars.iter());
            current_len += 1 + chars.len();
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }
        while chars.len() > width {
            let rest = chars.split_off(width);
            lines.push(chars.iter().collect());
            chars = rest;
        }
        current_len = chars.len();
        current = chars.into_iter().collect();
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// One positioned line of text.
#[derive(Clone, Debug, PartialEq)]
pub struct LineLayout {
    /// The line's text
    pub text: String,
    /// Left edge in canvas pixels
    pub x: f32,
    /// Top edge in canvas pixels
    pub y: f32,
    /// Measured width
    pub width: f32,
}

/// A measured, centered text block.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    /// Lines, top to bottom
    pub lines: Vec<LineLayout>,
    /// Top-left corner of the block
    pub origin: (f32, f32),
    /// Block width (widest line)
    pub width: f32,
    /// Block height including line spacing
    pub height: f32,
}

impl TextLayout {
    /// Centers `lines` on a `canvas_width` x `canvas_height` canvas. Each line is
    /// centered within the block.
    pub fn centered(
        lines: &[String],
        font: &SizedFont<'_>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        let line_height = font.line_height();
        let widths: Vec<f32> = lines.iter().map(|line| font.line_width(line)).collect();
        let width = widths.iter().copied().fold(0.0_f32, f32::max);
        let height = if lines.is_empty() {
            0.0
        } else {
            line_height * lines.len() as f32 + LINE_SPACING * (lines.len() - 1) as f32
        };
        let origin = (
            (canvas_width as f32 - width) / 2.0,
            (canvas_height as f32 - height) / 2.0,
        );
        let lines = lines
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (text, line_width))| LineLayout {
                text: text.clone(),
                x: origin.0 + (width - line_width) / 2.0,
                y: origin.1 + idx as f32 * (line_height + LINE_SPACING),
                width: line_width,
            })
            .collect();
        Self {
            lines,
            origin,
            width,
            height,
        }
    }

    /// Center point of the block.
    pub fn center(&self) -> (f32, f32) {
        (
            self.origin.0 + self.width / 2.0,
            self.origin.1 + self.height / 2.0,
        )
    }
}

//! Word-wrap layout for the text block.
//!
//! Splits on hard line breaks first, then greedily packs words into lines
//! against the width budget `surface_width × max_width_percent/100` minus the
//! padding reserved on both sides. Produces [`TextBlockMetrics`], which both
//! the renderer and the hit-tester consume — the clickable region is always
//! the same wrapped box that gets painted.

use crate::font::FontStore;
use crate::geom::{Point, Rect, Size};
use crate::scene::{TextAlign, TextConfig};

/// Padding reserved inside the block on every side, logical units.
pub const TEXT_PADDING: f32 = 10.0;

/// One wrapped line and its measured advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub width: f32,
}

/// Derived layout of the whole text block. Never authoritative state;
/// recomputed whenever the text configuration or surface width changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlockMetrics {
    pub lines: Vec<Line>,
    pub block_width: f32,
    pub block_height: f32,
}

impl TextBlockMetrics {
    pub fn block_size(&self) -> Size {
        Size::new(self.block_width, self.block_height)
    }

    /// The block's bounding box at a given origin.
    pub fn bounds(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.block_width, self.block_height)
    }
}

/// Lay out `config.content` against a surface of the given logical width.
pub fn layout(config: &TextConfig, surface_width: f32, fonts: &FontStore) -> TextBlockMetrics {
    let block_width = surface_width * config.max_width_percent / 100.0;
    let wrap_width = (block_width - 2.0 * TEXT_PADDING).max(0.0);
    let measure = |s: &str| fonts.measure(&config.font_family, config.font_size, s);

    let mut lines = Vec::new();
    // Hard breaks first; each segment contributes at least one line.
    for segment in config.content.split('\n') {
        let mut current = String::new();
        for word in segment.split(' ') {
            if current.is_empty() {
                // A single over-wide word still gets its own line, unsplit.
                current.push_str(word);
                continue;
            }
            let candidate_width = measure(&current) + measure(" ") + measure(word);
            if candidate_width > wrap_width {
                lines.push(Line {
                    width: measure(&current),
                    text: std::mem::take(&mut current),
                });
                current.push_str(word);
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }
        lines.push(Line {
            width: measure(&current),
            text: current,
        });
    }

    let line_advance = config.font_size * config.line_height;
    TextBlockMetrics {
        block_height: lines.len() as f32 * line_advance + 2.0 * TEXT_PADDING,
        block_width,
        lines,
    }
}

/// X origin of a line within the block box, resolved from the alignment.
pub fn line_x(config: &TextConfig, metrics: &TextBlockMetrics, line_width: f32) -> f32 {
    let origin_x = config.origin.x;
    match config.align {
        TextAlign::Left => origin_x + TEXT_PADDING,
        TextAlign::Center => origin_x + (metrics.block_width - line_width) / 2.0,
        TextAlign::Right => origin_x + metrics.block_width - TEXT_PADDING - line_width,
    }
}

/// Y origin (top) of line `index`.
pub fn line_y(config: &TextConfig, index: usize) -> f32 {
    config.origin.y + TEXT_PADDING + index as f32 * config.font_size * config.line_height
}

/// Caches the last computed metrics until the text configuration, surface
/// width, or registered fonts change.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entry: Option<(TextConfig, f32, u64, TextBlockMetrics)>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        config: &TextConfig,
        surface_width: f32,
        fonts: &FontStore,
    ) -> TextBlockMetrics {
        let generation = fonts.generation();
        if let Some((c, w, g, metrics)) = &self.entry
            && c == config
            && *w == surface_width
            && *g == generation
        {
            return metrics.clone();
        }
        let metrics = layout(config, surface_width, fonts);
        self.entry = Some((config.clone(), surface_width, generation, metrics.clone()));
        metrics
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

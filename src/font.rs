//! Font resolution, measurement, and glyph rasterization.
//!
//! Two faces, same as the preview renderer's split between bitmap and TTF
//! text: a built-in Spleen 12×24 bitmap face (always available, scaled to the
//! requested pixel size with nearest-neighbour sampling) and TTF faces
//! registered at runtime and rasterized through ab_glyph with anti-aliased
//! coverage. Unknown family names resolve to the bitmap face so layout and
//! rendering are total — a missing font can never fail a repaint.

use std::collections::HashMap;
use std::sync::Mutex;

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_12X24, PSF2Font};

use crate::error::LienzoError;
use crate::geom::Point;

const BITMAP_CHAR_WIDTH: usize = 12;
const BITMAP_CHAR_HEIGHT: usize = 24;

/// Resolves family names to faces and turns text into advances and coverage.
pub struct FontStore {
    ttf: HashMap<String, FontArc>,
    /// Cached 12×24 base bitmaps, one byte per pixel (0 or 1).
    glyph_cache: Mutex<HashMap<char, Option<Vec<u8>>>>,
    /// Bumped on registration so layout caches keyed on font state invalidate.
    generation: u64,
}

impl Default for FontStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStore {
    pub fn new() -> Self {
        Self {
            ttf: HashMap::new(),
            glyph_cache: Mutex::new(HashMap::new()),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register a TTF/OTF face for a family name, replacing any previous one.
    pub fn register_ttf(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), LienzoError> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| LienzoError::Font(format!("invalid font for {family:?}: {e}")))?;
        self.ttf.insert(family.to_string(), font);
        self.generation += 1;
        Ok(())
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.ttf.contains_key(family)
    }

    /// Measure the advance width of `text` at `px` pixel height.
    pub fn measure(&self, family: &str, px: f32, text: &str) -> f32 {
        match self.ttf.get(family) {
            Some(font) => {
                let scaled = font.as_scaled(px);
                text.chars()
                    .map(|ch| scaled.h_advance(font.glyph_id(ch)))
                    .sum()
            }
            // Bitmap face: fixed advance of half the pixel height (12/24).
            None => text.chars().count() as f32 * px * 0.5,
        }
    }

    /// Rasterize one line of text with its top-left corner at `origin`
    /// (physical pixels), calling `plot(x, y, coverage)` per covered pixel.
    pub fn draw_line<F>(&self, family: &str, px: f32, text: &str, origin: Point, mut plot: F)
    where
        F: FnMut(i32, i32, f32),
    {
        match self.ttf.get(family) {
            Some(font) => self.draw_ttf_line(font, px, text, origin, &mut plot),
            None => self.draw_bitmap_line(px, text, origin, &mut plot),
        }
    }

    fn draw_ttf_line<F>(&self, font: &FontArc, px: f32, text: &str, origin: Point, plot: &mut F)
    where
        F: FnMut(i32, i32, f32),
    {
        let scaled = font.as_scaled(px);
        let baseline_y = origin.y + scaled.ascent();
        let mut caret_x = origin.x;

        for ch in text.chars() {
            let glyph_id = font.glyph_id(ch);
            let glyph = glyph_id.with_scale_and_position(px, ab_glyph::point(caret_x, baseline_y));
            caret_x += scaled.h_advance(glyph_id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let x = gx as i32 + bounds.min.x as i32;
                    let y = gy as i32 + bounds.min.y as i32;
                    plot(x, y, coverage);
                });
            }
        }
    }

    fn draw_bitmap_line<F>(&self, px: f32, text: &str, origin: Point, plot: &mut F)
    where
        F: FnMut(i32, i32, f32),
    {
        let dst_h = px.round().max(1.0) as usize;
        let dst_w = (px * 0.5).round().max(1.0) as usize;
        let mut caret_x = origin.x;

        for ch in text.chars() {
            let base_x = caret_x.round() as i32;
            let base_y = origin.y.round() as i32;
            caret_x += px * 0.5;

            let Some(bitmap) = self.base_glyph(ch) else {
                continue;
            };

            // Nearest-neighbour scale from 12×24 to the target cell.
            for dy in 0..dst_h {
                let sy = dy * BITMAP_CHAR_HEIGHT / dst_h;
                for dx in 0..dst_w {
                    let sx = dx * BITMAP_CHAR_WIDTH / dst_w;
                    if bitmap[sy * BITMAP_CHAR_WIDTH + sx] != 0 {
                        plot(base_x + dx as i32, base_y + dy as i32, 1.0);
                    }
                }
            }
        }
    }

    /// Get or build the 12×24 base bitmap for a character.
    ///
    /// Characters missing from the Spleen face advance but draw nothing.
    fn base_glyph(&self, ch: char) -> Option<Vec<u8>> {
        let mut cache = self.glyph_cache.lock().expect("glyph cache poisoned");
        cache
            .entry(ch)
            .or_insert_with(|| generate_base_glyph(ch))
            .clone()
    }
}

/// Extract a character's bitmap from the Spleen 12×24 face.
fn generate_base_glyph(ch: char) -> Option<Vec<u8>> {
    let mut spleen = PSF2Font::new(FONT_12X24).ok()?;
    let utf8 = ch.to_string();
    let glyph = spleen.glyph_for_utf8(utf8.as_bytes())?;

    let mut bitmap = vec![0u8; BITMAP_CHAR_WIDTH * BITMAP_CHAR_HEIGHT];
    for (row_y, row) in glyph.enumerate() {
        for (col_x, on) in row.enumerate() {
            let idx = row_y * BITMAP_CHAR_WIDTH + col_x;
            if on && idx < bitmap.len() {
                bitmap[idx] = 1;
            }
        }
    }
    Some(bitmap)
}

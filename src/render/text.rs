//! Drawing the wrapped, gradient-filled text block.
//!
//! Each line is rasterized once into a coverage mask. When an outline is
//! configured the mask is dilated by the stroke radius and blended in the
//! outline color first, then the glyph coverage is filled on top with the
//! gradient. The gradient is vertical and spans the whole block — from the
//! top of the first line to the bottom of the last — so color transitions
//! continuously across lines instead of restarting per line.

use image::RgbaImage;

use crate::color::Color;
use crate::font::FontStore;
use crate::layout::{self, TEXT_PADDING, TextBlockMetrics};
use crate::scene::TextConfig;

/// Coverage mask for one rasterized line, with a margin for dilation.
struct LineMask {
    width: usize,
    height: usize,
    /// Surface position of the mask's top-left corner.
    origin_x: i32,
    origin_y: i32,
    coverage: Vec<f32>,
}

impl LineMask {
    fn rasterize(
        fonts: &FontStore,
        config: &TextConfig,
        text: &str,
        line_width: f32,
        x: f32,
        y: f32,
        scale: f32,
        margin: i32,
    ) -> Self {
        let px = config.font_size * scale;
        let width = (line_width * scale).ceil() as usize + 2 * margin as usize + 2;
        let height = px.ceil() as usize + 2 * margin as usize + 2;
        let origin_x = (x * scale).floor() as i32 - margin;
        let origin_y = (y * scale).floor() as i32 - margin;
        let mut mask = Self {
            width,
            height,
            origin_x,
            origin_y,
            coverage: vec![0.0; width * height],
        };

        let inner_x = x * scale - origin_x as f32;
        let inner_y = y * scale - origin_y as f32;
        fonts.draw_line(
            &config.font_family,
            px,
            text,
            crate::geom::Point::new(inner_x, inner_y),
            |gx, gy, cov| {
                if gx >= 0 && gy >= 0 && (gx as usize) < mask.width && (gy as usize) < mask.height
                {
                    let idx = gy as usize * mask.width + gx as usize;
                    mask.coverage[idx] = mask.coverage[idx].max(cov);
                }
            },
        );
        mask
    }

    /// Morphological dilation by a disc of radius `r` pixels.
    fn dilate(&self, r: i32) -> Vec<f32> {
        let mut out = vec![0.0f32; self.coverage.len()];
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let cov = self.coverage[y as usize * self.width + x as usize];
                if cov <= 0.0 {
                    continue;
                }
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx * dx + dy * dy > r * r {
                            continue;
                        }
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx >= 0 && ny >= 0 && (nx as usize) < self.width
                            && (ny as usize) < self.height
                        {
                            let idx = ny as usize * self.width + nx as usize;
                            out[idx] = out[idx].max(cov);
                        }
                    }
                }
            }
        }
        out
    }

    /// Blend a coverage buffer onto the surface, coloring each pixel through
    /// `color_at(surface_y)`.
    fn blend<F>(&self, buffer: &[f32], surface: &mut RgbaImage, color_at: F)
    where
        F: Fn(i32) -> Color,
    {
        let surf_w = surface.width() as i32;
        let surf_h = surface.height() as i32;
        for my in 0..self.height as i32 {
            let sy = self.origin_y + my;
            if sy < 0 || sy >= surf_h {
                continue;
            }
            for mx in 0..self.width as i32 {
                let cov = buffer[my as usize * self.width + mx as usize];
                if cov <= 0.0 {
                    continue;
                }
                let sx = self.origin_x + mx;
                if sx < 0 || sx >= surf_w {
                    continue;
                }
                let dst = surface.get_pixel(sx as u32, sy as u32).0;
                let out = color_at(sy).over(dst, cov);
                surface.put_pixel(sx as u32, sy as u32, image::Rgba(out));
            }
        }
    }
}

/// Draw the whole text block onto the surface.
pub fn draw_block(
    surface: &mut RgbaImage,
    config: &TextConfig,
    metrics: &TextBlockMetrics,
    fonts: &FontStore,
    scale: f32,
) {
    if metrics.lines.is_empty() {
        return;
    }

    // One gradient for the whole block: top of first line to bottom of last.
    let grad_top = (config.origin.y + TEXT_PADDING) * scale;
    let grad_bottom = grad_top
        + metrics.lines.len() as f32 * config.font_size * config.line_height * scale;
    let span = (grad_bottom - grad_top).max(1.0);
    let gradient = |sy: i32| {
        let t = (sy as f32 + 0.5 - grad_top) / span;
        config.gradient_start.lerp(config.gradient_end, t)
    };

    let stroke_r = (config.outline_width * scale).round() as i32;

    for (i, line) in metrics.lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let x = layout::line_x(config, metrics, line.width);
        let y = layout::line_y(config, i);
        let mask = LineMask::rasterize(
            fonts, config, &line.text, line.width, x, y, scale, stroke_r + 1,
        );

        // Stroke under fill, matching strokeText-then-fillText order.
        if stroke_r > 0 {
            let dilated = mask.dilate(stroke_r);
            mask.blend(&dilated, surface, |_| config.outline_color);
        }
        mask.blend(&mask.coverage, surface, gradient);
    }
}

//! Drawing a single image overlay onto the surface.
//!
//! The overlay is drawn about its centre: translate to
//! `(x + w/2, y + h/2)` in physical pixels, rotate by the overlay's angle,
//! and for the circle shape clip to radius `min(w, h)/2`. Rather than
//! forward-transforming source pixels, each destination pixel inside the
//! rotated bounding box is inverse-mapped into overlay-local space and
//! sampled from the source with nearest-neighbour lookup, then composited
//! source-over. Rows are processed in parallel.

use image::RgbaImage;
use rayon::prelude::*;

use crate::color::Color;
use crate::scene::{Overlay, OverlayShape};

/// Draw one overlay. The image must be fully decoded; callers skip overlays
/// whose decode is still pending.
pub fn draw(surface: &mut RgbaImage, overlay: &Overlay, image: &RgbaImage, scale: f32) {
    let src_w = image.width();
    let src_h = image.height();
    if src_w == 0 || src_h == 0 {
        return;
    }

    // Physical-space transform parameters.
    let half_w = overlay.size.width * scale / 2.0;
    let half_h = overlay.size.height * scale / 2.0;
    let cx = overlay.position.x * scale + half_w;
    let cy = overlay.position.y * scale + half_h;
    let theta = overlay.rotation.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();

    // Clip radius squared, only used for the circle shape.
    let radius_sq = {
        let r = half_w.min(half_h);
        r * r
    };

    // Axis-aligned bounds of the rotated rectangle, clamped to the surface.
    let extent_x = (half_w * cos_t).abs() + (half_h * sin_t).abs();
    let extent_y = (half_w * sin_t).abs() + (half_h * cos_t).abs();
    let surf_w = surface.width() as i32;
    let surf_h = surface.height() as i32;
    let x0 = ((cx - extent_x).floor() as i32).max(0);
    let x1 = ((cx + extent_x).ceil() as i32).min(surf_w);
    let y0 = ((cy - extent_y).floor() as i32).max(0);
    let y1 = ((cy + extent_y).ceil() as i32).min(surf_h);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let row_stride = surf_w as usize * 4;
    surface
        .as_mut()
        .par_chunks_exact_mut(row_stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            if y < y0 || y >= y1 {
                return;
            }
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                // Inverse rotation into overlay-local space.
                let local_x = dx * cos_t + dy * sin_t;
                let local_y = -dx * sin_t + dy * cos_t;

                if local_x < -half_w || local_x > half_w || local_y < -half_h || local_y > half_h
                {
                    continue;
                }
                if overlay.shape == OverlayShape::Circle
                    && local_x * local_x + local_y * local_y > radius_sq
                {
                    continue;
                }

                // Nearest-neighbour sample, local space mapped onto the
                // full source image.
                let u = ((local_x + half_w) / (2.0 * half_w) * src_w as f32) as u32;
                let v = ((local_y + half_h) / (2.0 * half_h) * src_h as f32) as u32;
                let src = image.get_pixel(u.min(src_w - 1), v.min(src_h - 1)).0;

                let offset = x as usize * 4;
                let dst: [u8; 4] = row[offset..offset + 4].try_into().unwrap();
                let out = Color::rgba(src[0], src[1], src[2], src[3]).over(dst, 1.0);
                row[offset..offset + 4].copy_from_slice(&out);
            }
        });
}

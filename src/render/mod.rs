//! Compositing and repaint scheduling.
//!
//! The [`Compositor`] is the sole owner of the physical RGBA surface. Every
//! paint is a full clear-and-redraw in a fixed order — background fill,
//! overlays in array order, then the text block — so partial or interleaved
//! paints are impossible and the output is a pure function of the scene,
//! the decoded-image store, and the fonts. Invalidations coalesce into a
//! single dirty flag; several decode completions in one pump still cost one
//! repaint.

pub mod overlay;
pub mod text;

use std::collections::HashMap;
use std::sync::Arc;

use image::{ImageEncoder, RgbaImage, codecs::png::PngEncoder};
use rayon::prelude::*;

use crate::error::LienzoError;
use crate::font::FontStore;
use crate::layout::{LayoutCache, TextBlockMetrics};
use crate::scene::{ImageHandle, SceneModel, TextConfig};
use crate::viewport::Viewport;

/// Decoded pixel sources, keyed by overlay image handle.
///
/// An overlay whose handle has no entry yet simply does not appear in that
/// paint pass; the entry landing later invalidates and repaints.
#[derive(Debug, Default)]
pub struct ImageStore {
    map: HashMap<ImageHandle, Arc<RgbaImage>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: ImageHandle, image: RgbaImage) {
        self.map.insert(handle, Arc::new(image));
    }

    pub fn get(&self, handle: ImageHandle) -> Option<&RgbaImage> {
        self.map.get(&handle).map(|a| a.as_ref())
    }

    pub fn remove(&mut self, handle: ImageHandle) {
        self.map.remove(&handle);
    }

    pub fn contains(&self, handle: ImageHandle) -> bool {
        self.map.contains_key(&handle)
    }
}

/// Owns the drawing surface and performs full repaints.
pub struct Compositor {
    surface: RgbaImage,
    layout_cache: LayoutCache,
    dirty: bool,
    has_painted: bool,
}

impl Compositor {
    pub fn new(viewport: &Viewport) -> Self {
        let (w, h) = viewport.physical_dimensions();
        Self {
            surface: RgbaImage::new(w, h),
            layout_cache: LayoutCache::new(),
            dirty: true,
            has_painted: false,
        }
    }

    /// Reallocate the backing store after a viewport resize.
    ///
    /// Destructive: prior pixel content is gone, so the caller must repaint
    /// immediately.
    pub fn resize_surface(&mut self, viewport: &Viewport) {
        let (w, h) = viewport.physical_dimensions();
        self.surface = RgbaImage::new(w, h);
        self.layout_cache.invalidate();
        self.dirty = true;
    }

    /// Mark the surface stale; coalesces with earlier invalidations.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Wrapped-block metrics for the current text config, cached until the
    /// config, surface width, or fonts change. Hit-testing uses this too.
    pub fn text_metrics(
        &mut self,
        config: &TextConfig,
        surface_width: f32,
        fonts: &FontStore,
    ) -> TextBlockMetrics {
        self.layout_cache.get(config, surface_width, fonts)
    }

    /// Clear and redraw the whole surface.
    pub fn repaint(
        &mut self,
        scene: &SceneModel,
        images: &ImageStore,
        fonts: &FontStore,
        viewport: &Viewport,
    ) {
        let scale = viewport.scale();

        // Background fill.
        let bg = scene.text.background_color;
        let px = [bg.r, bg.g, bg.b, bg.a];
        self.surface
            .as_mut()
            .par_chunks_exact_mut(4)
            .for_each(|p| p.copy_from_slice(&px));

        // Overlays in array order: index 0 is bottommost. Overlays whose
        // image has not decoded yet are skipped for this pass.
        for ov in scene.overlays() {
            if let Some(image) = images.get(ov.handle) {
                overlay::draw(&mut self.surface, ov, image, scale);
            }
        }

        let metrics = self
            .layout_cache
            .get(&scene.text, viewport.logical_width(), fonts);
        text::draw_block(&mut self.surface, &scene.text, &metrics, fonts, scale);

        self.dirty = false;
        self.has_painted = true;
    }

    /// Repaint only if something invalidated the surface since the last
    /// paint. Returns whether a paint happened.
    pub fn repaint_if_needed(
        &mut self,
        scene: &SceneModel,
        images: &ImageStore,
        fonts: &FontStore,
        viewport: &Viewport,
    ) -> bool {
        if self.dirty {
            self.repaint(scene, images, fonts, viewport);
            true
        } else {
            false
        }
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Encode the current composite as PNG bytes at physical resolution.
    ///
    /// Callable any time after the first successful paint.
    pub fn export_png(&self) -> Result<Vec<u8>, LienzoError> {
        if !self.has_painted {
            return Err(LienzoError::NotPainted);
        }
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                self.surface.as_raw(),
                self.surface.width(),
                self.surface.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| LienzoError::Image(format!("PNG encode failed: {e}")))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geom::Point;
    use crate::scene::OverlayShape;

    fn setup() -> (Viewport, SceneModel, ImageStore, FontStore) {
        let viewport = Viewport::new(100.0, 100.0, 1.0);
        let mut scene = SceneModel::new();
        scene.text.content = String::new();
        scene.text.background_color = Color::rgb(10, 20, 30);
        scene.clamp_text_origin(
            crate::geom::Size::new(90.0, 40.0),
            viewport.logical_size(),
        );
        (viewport, scene, ImageStore::new(), FontStore::new())
    }

    #[test]
    fn test_export_before_paint_fails() {
        let (viewport, ..) = setup();
        let compositor = Compositor::new(&viewport);
        assert!(matches!(
            compositor.export_png(),
            Err(LienzoError::NotPainted)
        ));
    }

    #[test]
    fn test_repaint_fills_background() {
        let (viewport, scene, images, fonts) = setup();
        let mut compositor = Compositor::new(&viewport);
        compositor.repaint(&scene, &images, &fonts, &viewport);
        let px = compositor.surface().get_pixel(0, 0);
        assert_eq!(px.0, [10, 20, 30, 255]);
        let png = compositor.export_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_dirty_flag_coalesces() {
        let (viewport, scene, images, fonts) = setup();
        let mut compositor = Compositor::new(&viewport);
        compositor.invalidate();
        compositor.invalidate();
        assert!(compositor.repaint_if_needed(&scene, &images, &fonts, &viewport));
        assert!(!compositor.repaint_if_needed(&scene, &images, &fonts, &viewport));
    }

    #[test]
    fn test_repaint_is_idempotent() {
        // Same inputs twice produce pixel-identical output.
        let (viewport, mut scene, mut images, fonts) = setup();
        scene.text.content = "Hello World".into();
        let handle = ImageHandle(1);
        images.insert(handle, RgbaImage::from_pixel(8, 8, image::Rgba([250, 5, 5, 255])));
        let idx = scene.add_overlay(handle);
        scene.set_overlay_rotation(idx, 30.0);
        scene.set_overlay_shape(idx, OverlayShape::Circle);

        let mut compositor = Compositor::new(&viewport);
        compositor.repaint(&scene, &images, &fonts, &viewport);
        let first = compositor.surface().clone();
        compositor.repaint(&scene, &images, &fonts, &viewport);
        assert_eq!(compositor.surface().as_raw(), first.as_raw());
    }

    #[test]
    fn test_undecoded_overlay_skipped() {
        let (viewport, mut scene, images, fonts) = setup();
        scene.add_overlay(ImageHandle(99));
        let mut compositor = Compositor::new(&viewport);
        compositor.repaint(&scene, &images, &fonts, &viewport);
        // Whole surface is still the background color.
        assert!(
            compositor
                .surface()
                .pixels()
                .all(|p| p.0 == [10, 20, 30, 255])
        );
    }

    #[test]
    fn test_resize_surface_is_destructive() {
        let (viewport, scene, images, fonts) = setup();
        let mut compositor = Compositor::new(&viewport);
        compositor.repaint(&scene, &images, &fonts, &viewport);

        let mut viewport = viewport;
        viewport.resize(50.0, 50.0);
        compositor.resize_surface(&viewport);
        assert!(compositor.is_dirty());
        assert_eq!(compositor.surface().width(), 50);
        // Fresh buffer: cleared, not carrying old pixels.
        assert_eq!(compositor.surface().get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_steady_state_independent_of_decode_order() {
        let (viewport, mut scene, _, fonts) = setup();
        let a = ImageHandle(1);
        let b = ImageHandle(2);
        scene.add_overlay(a);
        scene.add_overlay(b);
        let red = RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        // Both overlays land at the default position, so they overlap fully.
        scene.move_overlay(1, Point::new(0.0, 0.0));

        // Order 1: a then b.
        let mut images = ImageStore::new();
        let mut compositor = Compositor::new(&viewport);
        images.insert(a, red.clone());
        compositor.repaint(&scene, &images, &fonts, &viewport);
        images.insert(b, blue.clone());
        compositor.repaint(&scene, &images, &fonts, &viewport);
        let one = compositor.surface().clone();

        // Order 2: b then a.
        let mut images = ImageStore::new();
        let mut compositor = Compositor::new(&viewport);
        images.insert(b, blue);
        compositor.repaint(&scene, &images, &fonts, &viewport);
        images.insert(a, red);
        compositor.repaint(&scene, &images, &fonts, &viewport);
        let two = compositor.surface().clone();

        assert_eq!(one.as_raw(), two.as_raw());
    }
}

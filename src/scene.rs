//! The authoritative scene state: text configuration, overlay list, selection.
//!
//! All mutation goes through explicit transition functions that validate and
//! clamp their inputs, so every reachable state satisfies the invariants:
//! overlay sizes never drop below [`MIN_OVERLAY_SIZE`], the text origin keeps
//! the block on the surface, and the selection always indexes a live overlay.
//! Out-of-range input is clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geom::{Point, Rect, Size};

/// Minimum overlay edge length in logical units.
pub const MIN_OVERLAY_SIZE: f32 = 20.0;

/// Overlay size at creation.
pub const DEFAULT_OVERLAY_SIZE: f32 = 100.0;

/// Opaque reference into the decoded-image store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub u64);

/// Horizontal alignment of wrapped lines within the text block's own box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Overlay clip shape, resolved once at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayShape {
    #[default]
    Rectangle,
    Circle,
}

/// Configuration of the single styled text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    /// May contain hard line breaks ('\n').
    pub content: String,
    pub background_color: Color,
    pub font_color: Color,
    /// Pixel height, always > 0.
    pub font_size: f32,
    pub font_family: String,
    /// Top-left of the text block in logical units.
    pub origin: Point,
    /// Line height multiplier, ≥ 0.
    pub line_height: f32,
    /// Fraction of the surface width available to the block, 0–100.
    pub max_width_percent: f32,
    pub align: TextAlign,
    pub outline_color: Color,
    /// Stroke width in logical units; 0 disables the outline.
    pub outline_width: f32,
    /// Top color of the vertical gradient spanning the whole block.
    pub gradient_start: Color,
    /// Bottom color of the gradient.
    pub gradient_end: Color,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "Enter your text here".to_string(),
            background_color: Color::BLACK,
            font_color: Color::WHITE,
            font_size: 24.0,
            font_family: "Inter".to_string(),
            origin: Point::new(50.0, 50.0),
            line_height: 1.2,
            max_width_percent: 90.0,
            align: TextAlign::Center,
            outline_color: Color::BLACK,
            outline_width: 0.0,
            gradient_start: Color::WHITE,
            gradient_end: Color::WHITE,
        }
    }
}

/// Field-wise update to [`TextConfig`], as produced by control-panel input.
///
/// Absent fields are left untouched; present fields are clamped into range
/// when applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextConfigPatch {
    pub content: Option<String>,
    pub background_color: Option<Color>,
    pub font_color: Option<Color>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub origin: Option<Point>,
    pub line_height: Option<f32>,
    pub max_width_percent: Option<f32>,
    pub align: Option<TextAlign>,
    pub outline_color: Option<Color>,
    pub outline_width: Option<f32>,
    pub gradient_start: Option<Color>,
    pub gradient_end: Option<Color>,
}

/// A single positioned, resizable image layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub handle: ImageHandle,
    /// Top-left corner in logical units.
    pub position: Point,
    /// Both edges ≥ [`MIN_OVERLAY_SIZE`].
    pub size: Size,
    /// Rotation in degrees around the overlay centre.
    pub rotation: f32,
    pub shape: OverlayShape,
}

impl Overlay {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }
}

/// The scene: one text block, an ordered overlay list, and the selection.
///
/// Array order is paint order — index 0 is bottommost.
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    pub text: TextConfig,
    overlays: Vec<Overlay>,
    selected: Option<usize>,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay(&self, index: usize) -> Option<&Overlay> {
        self.overlays.get(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: usize) {
        if index < self.overlays.len() {
            self.selected = Some(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// True if any overlay references this decoded-image handle.
    pub fn uses_handle(&self, handle: ImageHandle) -> bool {
        self.overlays.iter().any(|o| o.handle == handle)
    }

    /// Append a new overlay with default geometry; returns its index.
    pub fn add_overlay(&mut self, handle: ImageHandle) -> usize {
        self.overlays.push(Overlay {
            handle,
            position: Point::new(0.0, 0.0),
            size: Size::new(DEFAULT_OVERLAY_SIZE, DEFAULT_OVERLAY_SIZE),
            rotation: 0.0,
            shape: OverlayShape::Rectangle,
        });
        self.overlays.len() - 1
    }

    /// Remove the overlay at `index` as one atomic update.
    ///
    /// Clears the selection iff it pointed at the removed entry; a selection
    /// past the removed index shifts down so it keeps tracking the same
    /// overlay. Returns the removed overlay's image handle.
    pub fn remove_overlay(&mut self, index: usize) -> Option<ImageHandle> {
        if index >= self.overlays.len() {
            return None;
        }
        let removed = self.overlays.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(removed.handle)
    }

    pub fn move_overlay(&mut self, index: usize, delta: Point) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.position = overlay.position.offset(delta);
        }
    }

    /// Resize from the bottom-right handle toward `pointer` (logical units).
    ///
    /// Each edge clamps to [`MIN_OVERLAY_SIZE`]; a pointer left of or above
    /// the origin can never produce a negative size.
    pub fn resize_overlay(&mut self, index: usize, pointer: Point) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.size.width = (pointer.x - overlay.position.x).max(MIN_OVERLAY_SIZE);
            overlay.size.height = (pointer.y - overlay.position.y).max(MIN_OVERLAY_SIZE);
        }
    }

    pub fn set_overlay_shape(&mut self, index: usize, shape: OverlayShape) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.shape = shape;
        }
    }

    pub fn set_overlay_rotation(&mut self, index: usize, degrees: f32) {
        if let Some(overlay) = self.overlays.get_mut(index) {
            overlay.rotation = degrees;
        }
    }

    /// Move the text origin by `delta`, keeping the block box on the surface.
    ///
    /// `block` is the current wrapped-block size from layout, `surface` the
    /// logical surface size.
    pub fn move_text(&mut self, delta: Point, block: Size, surface: Size) {
        self.text.origin = self.text.origin.offset(delta);
        self.clamp_text_origin(block, surface);
    }

    /// Clamp the text origin so the block stays within the surface.
    pub fn clamp_text_origin(&mut self, block: Size, surface: Size) {
        let max_x = (surface.width - block.width).max(0.0);
        let max_y = (surface.height - block.height).max(0.0);
        self.text.origin.x = self.text.origin.x.clamp(0.0, max_x);
        self.text.origin.y = self.text.origin.y.clamp(0.0, max_y);
    }

    /// Apply a control-panel patch, clamping out-of-range values.
    pub fn apply_text_patch(&mut self, patch: TextConfigPatch) {
        let t = &mut self.text;
        if let Some(content) = patch.content {
            t.content = content;
        }
        if let Some(c) = patch.background_color {
            t.background_color = c;
        }
        if let Some(c) = patch.font_color {
            t.font_color = c;
        }
        if let Some(size) = patch.font_size {
            t.font_size = size.max(1.0);
        }
        if let Some(family) = patch.font_family {
            t.font_family = family;
        }
        if let Some(origin) = patch.origin {
            t.origin = origin;
        }
        if let Some(lh) = patch.line_height {
            t.line_height = lh.max(0.0);
        }
        if let Some(pct) = patch.max_width_percent {
            t.max_width_percent = pct.clamp(0.0, 100.0);
        }
        if let Some(align) = patch.align {
            t.align = align;
        }
        if let Some(c) = patch.outline_color {
            t.outline_color = c;
        }
        if let Some(w) = patch.outline_width {
            t.outline_width = w.max(0.0);
        }
        if let Some(c) = patch.gradient_start {
            t.gradient_start = c;
        }
        if let Some(c) = patch.gradient_end {
            t.gradient_end = c;
        }
    }

    /// Reset the text block to its defaults. The block is never removed.
    pub fn reset_text(&mut self) {
        self.text = TextConfig::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scene_with_overlays(n: usize) -> SceneModel {
        let mut scene = SceneModel::new();
        for i in 0..n {
            scene.add_overlay(ImageHandle(i as u64));
        }
        scene
    }

    #[test]
    fn test_add_overlay_defaults() {
        let mut scene = SceneModel::new();
        let idx = scene.add_overlay(ImageHandle(7));
        assert_eq!(idx, 0);
        let o = scene.overlay(0).unwrap();
        assert_eq!(o.position, Point::new(0.0, 0.0));
        assert_eq!(o.size, Size::new(100.0, 100.0));
        assert_eq!(o.rotation, 0.0);
        assert_eq!(o.shape, OverlayShape::Rectangle);
    }

    #[test]
    fn test_remove_clears_selection_iff_removed() {
        let mut scene = scene_with_overlays(3);
        scene.select(1);
        scene.remove_overlay(1);
        assert_eq!(scene.selected(), None);

        let mut scene = scene_with_overlays(3);
        scene.select(0);
        scene.remove_overlay(1);
        assert_eq!(scene.selected(), Some(0));
    }

    #[test]
    fn test_remove_shifts_selection_to_track_same_overlay() {
        let mut scene = scene_with_overlays(3);
        scene.select(2);
        let tracked = scene.overlay(2).unwrap().handle;
        scene.remove_overlay(0);
        let sel = scene.selected().unwrap();
        assert_eq!(scene.overlay(sel).unwrap().handle, tracked);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut scene = scene_with_overlays(1);
        assert_eq!(scene.remove_overlay(5), None);
        assert_eq!(scene.overlays().len(), 1);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        // Scenario C: dragging the corner to (15, 15) clamps to 20×20.
        let mut scene = scene_with_overlays(1);
        scene.resize_overlay(0, Point::new(15.0, 15.0));
        assert_eq!(scene.overlay(0).unwrap().size, Size::new(20.0, 20.0));
    }

    #[test]
    fn test_resize_never_negative() {
        let mut scene = scene_with_overlays(1);
        scene.move_overlay(0, Point::new(50.0, 50.0));
        scene.resize_overlay(0, Point::new(-100.0, -100.0));
        let size = scene.overlay(0).unwrap().size;
        assert_eq!(size, Size::new(MIN_OVERLAY_SIZE, MIN_OVERLAY_SIZE));
    }

    #[test]
    fn test_move_text_clamps_to_surface() {
        let mut scene = SceneModel::new();
        let block = Size::new(450.0, 60.0);
        let surface = Size::new(500.0, 500.0);
        scene.move_text(Point::new(1000.0, -1000.0), block, surface);
        assert_eq!(scene.text.origin, Point::new(50.0, 0.0));
        scene.move_text(Point::new(-2000.0, 2000.0), block, surface);
        assert_eq!(scene.text.origin, Point::new(0.0, 440.0));
    }

    #[test]
    fn test_move_text_block_larger_than_surface_pins_to_zero() {
        let mut scene = SceneModel::new();
        scene.move_text(
            Point::new(30.0, 30.0),
            Size::new(600.0, 600.0),
            Size::new(500.0, 500.0),
        );
        assert_eq!(scene.text.origin, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_patch_clamps_ranges() {
        let mut scene = SceneModel::new();
        scene.apply_text_patch(TextConfigPatch {
            font_size: Some(-5.0),
            max_width_percent: Some(150.0),
            line_height: Some(-1.0),
            outline_width: Some(-3.0),
            ..Default::default()
        });
        assert_eq!(scene.text.font_size, 1.0);
        assert_eq!(scene.text.max_width_percent, 100.0);
        assert_eq!(scene.text.line_height, 0.0);
        assert_eq!(scene.text.outline_width, 0.0);
    }

    #[test]
    fn test_patch_from_json() {
        let mut scene = SceneModel::new();
        let patch: TextConfigPatch = serde_json::from_str(
            r##"{"content": "Hi", "align": "right", "gradient_start": "#ff0000"}"##,
        )
        .unwrap();
        scene.apply_text_patch(patch);
        assert_eq!(scene.text.content, "Hi");
        assert_eq!(scene.text.align, TextAlign::Right);
        assert_eq!(scene.text.gradient_start, Color::rgb(255, 0, 0));
        // Untouched field keeps its default.
        assert_eq!(scene.text.font_size, 24.0);
    }

    #[test]
    fn test_select_validates_index() {
        let mut scene = scene_with_overlays(1);
        scene.select(3);
        assert_eq!(scene.selected(), None);
        scene.select(0);
        assert_eq!(scene.selected(), Some(0));
    }

    #[test]
    fn test_reset_text_restores_defaults() {
        let mut scene = SceneModel::new();
        scene.apply_text_patch(TextConfigPatch {
            content: Some("changed".into()),
            ..Default::default()
        });
        scene.reset_text();
        assert_eq!(scene.text, TextConfig::default());
    }
}

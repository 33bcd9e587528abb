//! Device-pixel-ratio-aware surface sizing and coordinate conversion.
//!
//! The drawing surface is a square sized to the container, capped at
//! [`MAX_SURFACE_LOGICAL`] logical units. Physical (backing-store) size is
//! logical size times the device scale factor. Resizing the backing store is
//! destructive, so the compositor repaints immediately after every
//! [`Viewport::resize`].

use crate::geom::{Point, Size};

/// Largest logical edge length of the square surface.
pub const MAX_SURFACE_LOGICAL: f32 = 500.0;

/// Owns the surface's logical size and the logical→physical scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    logical: f32,
    scale: f32,
}

impl Viewport {
    /// Create a viewport for a container and device scale factor.
    ///
    /// `device_scale` below a sane minimum is clamped rather than rejected.
    pub fn new(container_width: f32, container_height: f32, device_scale: f32) -> Self {
        let mut v = Self {
            logical: 0.0,
            scale: device_scale.max(0.1),
        };
        v.resize(container_width, container_height);
        v
    }

    /// Recompute the surface size from new container bounds.
    ///
    /// Must be called on first mount and whenever the container changes.
    /// Returns the new physical pixel dimensions.
    pub fn resize(&mut self, container_width: f32, container_height: f32) -> (u32, u32) {
        self.logical = container_width
            .min(container_height)
            .min(MAX_SURFACE_LOGICAL)
            .max(1.0);
        self.physical_dimensions()
    }

    /// Logical edge length of the (square) surface.
    pub fn logical_size(&self) -> Size {
        Size::new(self.logical, self.logical)
    }

    pub fn logical_width(&self) -> f32 {
        self.logical
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Physical backing-store dimensions in pixels.
    pub fn physical_dimensions(&self) -> (u32, u32) {
        let px = (self.logical * self.scale).round().max(1.0) as u32;
        (px, px)
    }

    pub fn to_physical(&self, p: Point) -> Point {
        Point::new(p.x * self.scale, p.y * self.scale)
    }

    pub fn to_logical(&self, p: Point) -> Point {
        Point::new(p.x / self.scale, p.y / self.scale)
    }
}

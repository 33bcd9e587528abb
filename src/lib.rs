//! # Lienzo - Canvas Composition Library
//!
//! Lienzo is a Rust library for composing a square raster image out of a
//! styled text block and draggable image overlays, driven by direct
//! manipulation. It provides:
//!
//! - **Scene model**: validated text configuration, ordered overlays, selection
//! - **Text layout**: greedy word wrap with gradient fill and outline stroke
//! - **Overlays**: rotation and circle clipping via inverse-mapped sampling
//! - **Gestures**: one pointer state machine for mouse and touch
//! - **Export**: PNG at full backing-store resolution, with upload seams
//!
//! ## Quick Start
//!
//! ```
//! use lienzo::{Editor, TextConfigPatch};
//!
//! // Size the editor to its container at 2x device pixel ratio.
//! let mut editor = Editor::new(600.0, 400.0, 2.0);
//!
//! // Update the caption through a field-wise patch.
//! editor.apply_text_patch(TextConfigPatch {
//!     content: Some("Hello World".to_string()),
//!     font_size: Some(32.0),
//!     ..Default::default()
//! });
//!
//! // The surface repaints synchronously; export it as PNG bytes.
//! let png = editor.export_png()?;
//! assert_eq!(&png[1..4], b"PNG");
//! # Ok::<(), lienzo::LienzoError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`editor`] | Facade wiring the pieces together |
//! | [`scene`] | Authoritative scene state and transitions |
//! | [`layout`] | Word-wrap metrics shared by renderer and hit-tester |
//! | [`render`] | Compositor, overlay drawing, text drawing |
//! | [`input`] | Pointer gesture state machine |
//! | [`viewport`] | DPR-aware sizing and coordinate conversion |
//! | [`font`] | Bitmap and TTF face resolution |
//! | [`decode`] | Background image decoding |
//! | [`collab`] | Text generation and upload collaborators |
//! | [`credits`] | Metered-action ledger |
//! | [`error`] | Error types |

pub mod collab;
pub mod color;
pub mod credits;
pub mod decode;
pub mod editor;
pub mod error;
pub mod font;
pub mod geom;
pub mod input;
pub mod layout;
pub mod render;
pub mod scene;
pub mod viewport;

pub use collab::{CloudUploader, TextGenerator};
pub use color::Color;
pub use credits::{CreditKind, CreditLedger, MemoryLedger};
pub use editor::{Editor, Export};
pub use error::LienzoError;
pub use font::FontStore;
pub use geom::{Point, Rect, Size};
pub use input::{Gesture, InteractionController, Outcome, PointerEvent, PointerPhase};
pub use layout::TextBlockMetrics;
pub use render::{Compositor, ImageStore};
pub use scene::{
    ImageHandle, Overlay, OverlayShape, SceneModel, TextAlign, TextConfig, TextConfigPatch,
};
pub use viewport::Viewport;

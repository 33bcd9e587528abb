//! The editor facade: one object owning the scene, viewport, fonts, decoded
//! images, compositor, and gesture state, with the collaborator seams
//! plugged in behind traits.
//!
//! Mutating calls repaint synchronously before returning, so the surface a
//! caller reads is never stale. Decode completions are the exception: they
//! arrive asynchronously and are folded in by [`Editor::pump`], which
//! coalesces however many arrived into a single repaint.

use std::time::Duration;

use image::RgbaImage;
use log::{debug, warn};

use crate::collab::{CloudUploader, TextGenerator};
use crate::credits::{CreditKind, CreditLedger, MemoryLedger};
use crate::decode::Decoder;
use crate::error::LienzoError;
use crate::font::FontStore;
use crate::input::{InteractionController, Outcome, PointerEvent};
use crate::render::{Compositor, ImageStore};
use crate::scene::{ImageHandle, OverlayShape, SceneModel, TextConfigPatch};
use crate::viewport::Viewport;

/// Result of an export-and-upload: the PNG always survives, even when the
/// upload leg failed.
#[derive(Debug)]
pub struct Export {
    pub png: Vec<u8>,
    pub url: Result<String, LienzoError>,
}

pub struct Editor {
    viewport: Viewport,
    scene: SceneModel,
    fonts: FontStore,
    images: ImageStore,
    compositor: Compositor,
    controller: InteractionController,
    decoder: Decoder,
    ledger: Box<dyn CreditLedger>,
    generator: Option<Box<dyn TextGenerator>>,
    uploader: Option<Box<dyn CloudUploader>>,
}

impl Editor {
    /// Create an editor sized to a container, and paint the first frame.
    pub fn new(container_width: f32, container_height: f32, device_scale: f32) -> Self {
        let viewport = Viewport::new(container_width, container_height, device_scale);
        let mut editor = Self {
            compositor: Compositor::new(&viewport),
            viewport,
            scene: SceneModel::new(),
            fonts: FontStore::new(),
            images: ImageStore::new(),
            controller: InteractionController::new(),
            decoder: Decoder::new(),
            ledger: Box::new(MemoryLedger::default()),
            generator: None,
            uploader: None,
        };
        editor.clamp_text();
        editor.repaint();
        editor
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn surface(&self) -> &RgbaImage {
        self.compositor.surface()
    }

    pub fn set_generator(&mut self, generator: Box<dyn TextGenerator>) {
        self.generator = Some(generator);
    }

    pub fn set_uploader(&mut self, uploader: Box<dyn CloudUploader>) {
        self.uploader = Some(uploader);
    }

    pub fn set_ledger(&mut self, ledger: Box<dyn CreditLedger>) {
        self.ledger = ledger;
    }

    pub fn credits_remaining(&mut self, kind: CreditKind) -> u32 {
        self.ledger.remaining(kind)
    }

    /// Require the pointer to dwell this long before a press becomes a drag.
    /// `None` restores immediate drags.
    pub fn set_long_press(&mut self, delay: Option<Duration>) {
        self.controller = match delay {
            Some(d) => InteractionController::with_long_press(d),
            None => InteractionController::new(),
        };
    }

    /// Register a TTF/OTF face; text using this family relays out and
    /// repaints.
    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), LienzoError> {
        self.fonts.register_ttf(family, bytes)?;
        self.clamp_text();
        self.repaint();
        Ok(())
    }

    /// Resize to new container bounds. The backing store reallocates, so
    /// this always ends in a full repaint.
    pub fn resize(&mut self, container_width: f32, container_height: f32) {
        let (w, h) = self.viewport.resize(container_width, container_height);
        debug!("viewport resized to {w}x{h} physical");
        self.compositor.resize_surface(&self.viewport);
        self.clamp_text();
        self.repaint();
    }

    /// Feed one pointer event (mouse or touch) through the gesture machine.
    pub fn pointer_event(&mut self, event: PointerEvent) -> Outcome {
        let metrics =
            self.compositor
                .text_metrics(&self.scene.text, self.viewport.logical_width(), &self.fonts);
        let outcome = self
            .controller
            .on_pointer(event, &mut self.scene, &metrics, &self.viewport);
        if outcome == Outcome::Repaint {
            self.repaint();
        }
        outcome
    }

    /// Apply a control-panel update to the text block.
    pub fn apply_text_patch(&mut self, patch: TextConfigPatch) {
        self.scene.apply_text_patch(patch);
        self.clamp_text();
        self.repaint();
    }

    /// Restore the text block to its defaults.
    pub fn reset_text(&mut self) {
        self.scene.reset_text();
        self.clamp_text();
        self.repaint();
    }

    /// Add an overlay from encoded image bytes.
    ///
    /// Unrecognized bytes fail synchronously and no overlay is created. On
    /// success the overlay exists (and is selected) immediately with default
    /// geometry; its pixels appear once the background decode lands via
    /// [`Editor::pump`].
    pub fn add_overlay(&mut self, bytes: Vec<u8>) -> Result<usize, LienzoError> {
        let handle = self.decoder.begin(bytes)?;
        let index = self.scene.add_overlay(handle);
        self.scene.select(index);
        self.repaint();
        Ok(index)
    }

    /// Add an overlay from already-decoded pixels, synchronously.
    pub fn add_overlay_image(&mut self, image: RgbaImage) -> usize {
        let handle = self.decoder.allocate_handle();
        self.images.insert(handle, image);
        let index = self.scene.add_overlay(handle);
        self.scene.select(index);
        self.repaint();
        index
    }

    /// Remove an overlay, dropping its decoded pixels when nothing else
    /// references them.
    pub fn remove_overlay(&mut self, index: usize) {
        if let Some(handle) = self.scene.remove_overlay(index) {
            if !self.scene.uses_handle(handle) {
                self.images.remove(handle);
            }
            self.repaint();
        }
    }

    pub fn set_overlay_shape(&mut self, index: usize, shape: OverlayShape) {
        self.scene.set_overlay_shape(index, shape);
        self.repaint();
    }

    pub fn set_overlay_rotation(&mut self, index: usize, degrees: f32) {
        self.scene.set_overlay_rotation(index, degrees);
        self.repaint();
    }

    /// Fold in decode completions that arrived since the last pump.
    ///
    /// Completions for handles no longer referenced by any overlay are
    /// dropped. A failed decode removes its overlay and reports the error.
    /// However many completions arrived, at most one repaint happens.
    pub fn pump(&mut self) -> Vec<LienzoError> {
        let mut errors = Vec::new();
        for event in self.decoder.drain() {
            if !self.scene.uses_handle(event.handle) {
                debug!("dropping stale decode for {:?}", event.handle);
                continue;
            }
            match event.result {
                Ok(image) => {
                    self.images.insert(event.handle, image);
                    self.compositor.invalidate();
                }
                Err(reason) => {
                    warn!("decode failed for {:?}: {reason}", event.handle);
                    self.remove_overlays_for(event.handle);
                    errors.push(LienzoError::Image(reason));
                    self.compositor.invalidate();
                }
            }
        }
        self.compositor
            .repaint_if_needed(&self.scene, &self.images, &self.fonts, &self.viewport);
        errors
    }

    /// Generate caption text from a prompt and install it as the block's
    /// content. Costs one generation credit, charged only on success; a
    /// failed generation leaves the scene untouched.
    pub async fn generate_text(&mut self, prompt: &str) -> Result<(), LienzoError> {
        if self.ledger.remaining(CreditKind::Generation) == 0 {
            return Err(LienzoError::CreditsExhausted(
                CreditKind::Generation.label(),
            ));
        }
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| LienzoError::Generate("no text generator configured".into()))?;

        let text = generator.generate(prompt).await?;
        self.ledger.try_consume(CreditKind::Generation)?;
        self.scene.text.content = text;
        self.clamp_text();
        self.repaint();
        Ok(())
    }

    /// Encode the current composite as PNG bytes. Not metered.
    pub fn export_png(&self) -> Result<Vec<u8>, LienzoError> {
        self.compositor.export_png()
    }

    /// Export the composite and push it to the configured uploader.
    ///
    /// Costs one export credit, charged only when the upload succeeds. The
    /// returned [`Export`] always carries the PNG; a failed upload reports
    /// its error alongside rather than discarding the bytes.
    pub async fn export_and_upload(&mut self) -> Result<Export, LienzoError> {
        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| LienzoError::Upload("no uploader configured".into()))?;
        if self.ledger.remaining(CreditKind::Export) == 0 {
            return Err(LienzoError::CreditsExhausted(CreditKind::Export.label()));
        }

        let png = self.compositor.export_png()?;
        let url = uploader.upload(&png).await;
        if url.is_ok() {
            self.ledger.try_consume(CreditKind::Export)?;
        }
        Ok(Export { png, url })
    }

    fn remove_overlays_for(&mut self, handle: ImageHandle) {
        while let Some(pos) = self
            .scene
            .overlays()
            .iter()
            .position(|o| o.handle == handle)
        {
            self.scene.remove_overlay(pos);
        }
        self.images.remove(handle);
    }

    /// Keep the text block on the surface under its current metrics.
    fn clamp_text(&mut self) {
        let metrics =
            self.compositor
                .text_metrics(&self.scene.text, self.viewport.logical_width(), &self.fonts);
        self.scene
            .clamp_text_origin(metrics.block_size(), self.viewport.logical_size());
    }

    fn repaint(&mut self) {
        self.compositor
            .repaint(&self.scene, &self.images, &self.fonts, &self.viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedGenerator(Result<String, String>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LienzoError> {
            self.0
                .clone()
                .map_err(LienzoError::Generate)
        }
    }

    struct RecordingUploader {
        succeed: bool,
        received: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl CloudUploader for RecordingUploader {
        async fn upload(&self, png: &[u8]) -> Result<String, LienzoError> {
            self.received.lock().unwrap().push(png.len());
            if self.succeed {
                Ok("https://example.test/out.png".into())
            } else {
                Err(LienzoError::Upload("service unavailable".into()))
            }
        }
    }

    #[tokio::test]
    async fn test_generation_charges_credit_on_success_only() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        editor.set_generator(Box::new(FixedGenerator(Ok("A caption".into()))));
        assert_eq!(editor.credits_remaining(CreditKind::Generation), 5);

        editor.generate_text("something funny").await.unwrap();
        assert_eq!(editor.scene().text.content, "A caption");
        assert_eq!(editor.credits_remaining(CreditKind::Generation), 4);

        editor.set_generator(Box::new(FixedGenerator(Err("model offline".into()))));
        let err = editor.generate_text("again").await.unwrap_err();
        assert!(matches!(err, LienzoError::Generate(_)));
        // Scene and balance both untouched by the failure.
        assert_eq!(editor.scene().text.content, "A caption");
        assert_eq!(editor.credits_remaining(CreditKind::Generation), 4);
    }

    #[tokio::test]
    async fn test_generation_blocked_when_exhausted() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        editor.set_ledger(Box::new(crate::credits::MemoryLedger::new(0)));
        editor.set_generator(Box::new(FixedGenerator(Ok("unreachable".into()))));
        let err = editor.generate_text("prompt").await.unwrap_err();
        assert!(matches!(err, LienzoError::CreditsExhausted(_)));
        assert_ne!(editor.scene().text.content, "unreachable");
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_png_and_credit() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        editor.set_uploader(Box::new(RecordingUploader {
            succeed: false,
            received: Mutex::new(Vec::new()),
        }));

        let export = editor.export_and_upload().await.unwrap();
        assert!(!export.png.is_empty());
        assert_eq!(&export.png[1..4], b"PNG");
        assert!(export.url.is_err());
        // Failed upload does not consume the credit.
        assert_eq!(editor.credits_remaining(CreditKind::Export), 5);
    }

    #[tokio::test]
    async fn test_successful_upload_charges_once() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        editor.set_uploader(Box::new(RecordingUploader {
            succeed: true,
            received: Mutex::new(Vec::new()),
        }));
        let export = editor.export_and_upload().await.unwrap();
        assert_eq!(export.url.unwrap(), "https://example.test/out.png");
        assert_eq!(editor.credits_remaining(CreditKind::Export), 4);
    }

    #[test]
    fn test_plain_export_is_not_metered() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        editor.export_png().unwrap();
        editor.export_png().unwrap();
        assert_eq!(editor.credits_remaining(CreditKind::Export), 5);
    }

    #[test]
    fn test_remove_overlay_releases_unshared_image() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]));
        let idx = editor.add_overlay_image(img);
        let handle = editor.scene().overlay(idx).unwrap().handle;
        assert!(editor.images.contains(handle));

        editor.remove_overlay(idx);
        assert!(!editor.images.contains(handle));
        assert!(editor.scene().overlays().is_empty());
    }

    #[tokio::test]
    async fn test_pump_ignores_stale_decode() {
        let mut editor = Editor::new(500.0, 500.0, 1.0);
        let png = {
            let img = RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]));
            let mut bytes = Vec::new();
            image::ImageEncoder::write_image(
                image::codecs::png::PngEncoder::new(&mut bytes),
                img.as_raw(),
                2,
                2,
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
            bytes
        };
        let idx = editor.add_overlay(png).unwrap();
        let handle = editor.scene().overlay(idx).unwrap().handle;
        // Overlay removed before its decode lands.
        editor.remove_overlay(idx);

        // Wait for the blocking decode, then pump.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let errors = editor.pump();
        assert!(errors.is_empty());
        assert!(!editor.images.contains(handle));
    }
}

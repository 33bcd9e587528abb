//! Background image decoding.
//!
//! Decoding a pasted or uploaded image can take long enough to stall a
//! frame, so the bytes are validated up front (cheap header sniff) and the
//! pixel decode runs on the blocking pool. Completion lands as an event on
//! an unbounded channel; the editor drains the channel on its pump and
//! repaints once however many completions arrived.

use image::RgbaImage;
use tokio::sync::mpsc;

use crate::error::LienzoError;
use crate::scene::ImageHandle;

/// Decode completion for one handle. `result` carries the pixels or the
/// reason the decode failed.
#[derive(Debug)]
pub struct DecodeEvent {
    pub handle: ImageHandle,
    pub result: Result<RgbaImage, String>,
}

/// Hands out image handles and runs decodes off-thread.
pub struct Decoder {
    tx: mpsc::UnboundedSender<DecodeEvent>,
    rx: mpsc::UnboundedReceiver<DecodeEvent>,
    next_id: u64,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, next_id: 1 }
    }

    /// Allocate a handle without scheduling a decode, for images that are
    /// already pixel data.
    pub fn allocate_handle(&mut self) -> ImageHandle {
        let handle = ImageHandle(self.next_id);
        self.next_id += 1;
        handle
    }

    /// Validate `bytes` as a known image format and schedule its decode.
    ///
    /// Unrecognized bytes fail here, synchronously, before any handle or
    /// overlay exists. A recognized header that turns out to be a corrupt
    /// file fails later through the [`DecodeEvent`].
    pub fn begin(&mut self, bytes: Vec<u8>) -> Result<ImageHandle, LienzoError> {
        image::guess_format(&bytes)
            .map_err(|_| LienzoError::Image("unrecognized image format".into()))?;

        let handle = self.allocate_handle();
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = image::load_from_memory(&bytes)
                .map(|img| img.to_rgba8())
                .map_err(|e| e.to_string());
            // The receiver only closes when the editor is dropped.
            let _ = tx.send(DecodeEvent { handle, result });
        });
        Ok(handle)
    }

    /// Take every decode that has completed since the last drain.
    pub fn drain(&mut self) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

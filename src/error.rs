//! # Error Types
//!
//! This module defines error types used throughout the lienzo library.
//!
//! Nothing here is fatal to the host process: input-validation problems are
//! clamped at the scene boundary and never reach this enum, and resource
//! failures (decode, generation, upload) leave the scene in its last valid
//! state so the next successful repaint recovers.

use thiserror::Error;

/// Main error type for lienzo operations
#[derive(Debug, Error)]
pub enum LienzoError {
    /// Image data could not be recognized or decoded
    #[error("Image error: {0}")]
    Image(String),

    /// Font registration or lookup error
    #[error("Font error: {0}")]
    Font(String),

    /// Text generation collaborator failed
    #[error("Text generation error: {0}")]
    Generate(String),

    /// Cloud upload collaborator failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// A credit-gated action was attempted with no allowance left
    #[error("No {0} credits remaining")]
    CreditsExhausted(&'static str),

    /// Export requested before the first successful paint
    #[error("Nothing painted yet: export requires at least one repaint")]
    NotPainted,

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for MarkFrame

use thiserror::Error;

use crate::capability::CapabilityKind;

/// Main error type for MarkFrame operations
#[derive(Error, Debug)]
pub enum MarkframeError {
    /// A required capability has not finished loading (or failed to load)
    #[error("Capability not ready: {0}")]
    CapabilityNotReady(CapabilityKind),

    /// A placeholder in rendered HTML has no entry in its shield table
    #[error("Shield placeholder {index} has no table entry")]
    ShieldMismatch { index: usize },

    /// A single math span could not be typeset
    #[error("Math typesetting failed for {tex:?}: {reason}")]
    MathTypeset { tex: String, reason: String },

    /// Rasterization threw or produced no image
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// The system clipboard rejected the image
    #[error("Clipboard write failed: {0}")]
    ClipboardWriteFailed(String),

    /// A data URL could not be decoded
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Image decoding/encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Style or CLI configuration could not be read
    #[error("Config error: {0}")]
    Config(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarkframeError {
    /// Text shown to the user in a blocking alert.
    ///
    /// Only failures of a completed user action (export, copy) produce a
    /// message; everything else degrades silently and is logged.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            MarkframeError::CaptureFailed(_) => {
                Some("Export failed. Please try a simpler background or a different renderer.")
            }
            MarkframeError::ClipboardWriteFailed(_) => Some("Copy failed. Please try again."),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MarkframeError {
    fn from(err: serde_json::Error) -> Self {
        MarkframeError::Config(err.to_string())
    }
}

/// Result type alias using MarkframeError
pub type MarkframeResult<T> = Result<T, MarkframeError>;

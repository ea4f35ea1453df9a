//! Error taxonomy of the QR intake pipeline.
//!
//! Every variant is recovered where it occurs and turned into a single
//! user-facing notification; none of them terminates the session.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Could not load image file: {0}")]
    ImageLoad(String),

    #[error("No QR code found in the image")]
    NoSymbolFound,

    #[error("Invalid QR code data: {0}")]
    InvalidPayload(String),

    /// Same as `InvalidPayload`, for text read from the camera.
    #[error("Scanned QR code is not valid: {0}")]
    InvalidScan(String),

    #[error("Processing error: {0}")]
    Submission(String),

    #[error("Camera error: {0}")]
    Camera(String),
}

impl PipelineError {
    /// Short category label for display.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::ImageLoad(_) => "Image Error",
            PipelineError::NoSymbolFound => "No QR Code",
            PipelineError::InvalidPayload(_) | PipelineError::InvalidScan(_) => "Invalid Payload",
            PipelineError::Submission(_) => "Submission Error",
            PipelineError::Camera(_) => "Camera Error",
        }
    }
}

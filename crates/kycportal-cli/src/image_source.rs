//! Upload acquisition: image files decoded into RGBA pixel buffers.

use kycportal_core::PipelineError;
use std::path::Path;

/// Full-frame RGBA pixels of one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel.
    pub rgba: Vec<u8>,
}

impl PixelBuffer {
    /// Luminance of every pixel (Y = 0.299*R + 0.587*G + 0.114*B), alpha
    /// composited over white so transparent areas read as background.
    pub fn to_luma(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .map(|px| {
                let alpha = px[3] as u32;
                let blend = |c: u8| (c as u32 * alpha + 255 * (255 - alpha)) / 255;
                ((blend(px[0]) * 299 + blend(px[1]) * 587 + blend(px[2]) * 114) / 1000) as u8
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Decode encoded image bytes (PNG, JPEG) into a pixel buffer.
pub fn decode_image_buffer(bytes: &[u8]) -> Result<PixelBuffer, PipelineError> {
    let img = image::load_from_memory(bytes).map_err(|e| PipelineError::ImageLoad(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::ImageLoad("image has no pixels".to_string()));
    }
    Ok(PixelBuffer {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Read an uploaded file from disk.
pub async fn read_upload(path: &Path) -> Result<Vec<u8>, PipelineError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::ImageLoad(format!("{}: {}", path.display(), e)))
}

/// Off-screen surface reused across uploads.
///
/// Each draw resizes the surface to the image's native size and keeps the
/// allocation for the next one. Only one upload is drawn at a time.
#[derive(Debug, Default)]
pub struct DecodeSurface {
    frame: PixelBuffer,
}

impl DecodeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` onto the surface and return the full frame.
    ///
    /// On failure the surface is left empty.
    pub fn draw(&mut self, bytes: &[u8]) -> Result<&PixelBuffer, PipelineError> {
        self.clear();
        let decoded = decode_image_buffer(bytes)?;
        self.frame.width = decoded.width;
        self.frame.height = decoded.height;
        self.frame.rgba.extend_from_slice(&decoded.rgba);
        tracing::debug!("Decoded upload onto {}x{} surface", decoded.width, decoded.height);
        Ok(&self.frame)
    }

    pub fn clear(&mut self) {
        self.frame.width = 0;
        self.frame.height = 0;
        self.frame.rgba.clear();
    }
}

//! QR symbol decoding from pixel buffers.
//!
//! Uses rqrr on a greyscale copy of the frame. Pure functions: a failed
//! decode leaves nothing behind for the next frame.

use crate::image_source::PixelBuffer;
use kycportal_core::PipelineError;

/// Decode every readable QR symbol in a greyscale frame, in detection order.
pub fn decode_all_luma(width: usize, height: usize, luma: &[u8]) -> Vec<String> {
    if width == 0 || height == 0 || luma.len() < width * height {
        return Vec::new();
    }

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        luma.get(y * width + x).copied().unwrap_or(255)
    });
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Vec::new();
    }
    tracing::debug!("Detected {} QR grid(s) in {}x{} frame", grids.len(), width, height);

    let mut symbols = Vec::with_capacity(grids.len());
    for grid in &grids {
        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    "QR decoded: {} bytes, ECC={:?}, version={:?}",
                    content.len(),
                    meta.ecc_level,
                    meta.version
                );
                symbols.push(content);
            }
            Err(e) => tracing::warn!("QR decode error: {:?}", e),
        }
    }
    symbols
}

/// Decode the first QR symbol of an uploaded frame.
pub fn decode_symbol(frame: &PixelBuffer) -> Result<String, PipelineError> {
    let luma = frame.to_luma();
    decode_all_luma(frame.width as usize, frame.height as usize, &luma)
        .into_iter()
        .next()
        .ok_or(PipelineError::NoSymbolFound)
}

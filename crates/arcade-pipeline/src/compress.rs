//! CPU-bound compression of a raw framebuffer into a wire-ready JPEG.

use crate::error::{PipelineError, Result};
use arcade_types::RawFrame;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageBuffer, Rgba};

/// Default JPEG quality preset (§4.4: "quality preset ≈75").
pub const DEFAULT_QUALITY: u8 = 75;

/// A compressed frame ready for the wire.
#[derive(Debug, Clone)]
pub struct CompressedFrame {
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Source frame width.
    pub width: u32,
    /// Source frame height.
    pub height: u32,
    /// When the source frame was captured, milliseconds since the Unix epoch.
    pub captured_at_ms: u64,
}

/// Encode a raw RGBA framebuffer to JPEG at `quality` (0-100).
///
/// Runs on whatever thread calls it; the caller is expected to run this
/// inside `spawn_blocking` since JPEG encoding is CPU-bound.
pub fn compress(frame: &RawFrame, quality: u8) -> Result<CompressedFrame> {
    let expected = (frame.width * frame.height * 4) as usize;
    if frame.rgba.len() != expected {
        return Err(PipelineError::BadDimensions {
            width: frame.width,
            height: frame.height,
            expected,
            actual: frame.rgba.len(),
        });
    }

    let image: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.rgba.clone())
            .expect("length was validated above");

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder
        .encode(image.as_raw(), frame.width, frame.height, ColorType::Rgba8)
        .map_err(|e| PipelineError::Encode(e.to_string()))?;

    Ok(CompressedFrame {
        jpeg,
        width: frame.width,
        height: frame.height,
        captured_at_ms: frame.captured_at_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32) -> RawFrame {
        RawFrame {
            rgba: vec![128; (width * height * 4) as usize],
            width,
            height,
            captured_at_ms: 0,
        }
    }

    #[test]
    fn compresses_a_standard_frame() {
        let frame = solid_frame(160, 144);
        let compressed = compress(&frame, DEFAULT_QUALITY).unwrap();
        assert!(!compressed.jpeg.is_empty());
        assert_eq!(compressed.width, 160);
        assert_eq!(compressed.height, 144);
    }

    #[test]
    fn rejects_mismatched_buffer_length() {
        let mut frame = solid_frame(160, 144);
        frame.rgba.truncate(10);
        assert!(compress(&frame, DEFAULT_QUALITY).is_err());
    }
}

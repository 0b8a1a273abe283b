use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::models::error::CaptureError;

/// Decode a captured photo, bake its EXIF orientation into the pixels and
/// re-encode it as JPEG at `quality` (1–100).
///
/// Sensors store frames in their native orientation and tag the rotation; the
/// stored asset must look right to viewers that ignore the tag.
pub fn normalize_to_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>, CaptureError> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CaptureError::EncodingFailed(format!("failed to sniff image format: {}", e)))?
        .into_decoder()
        .map_err(|e| CaptureError::EncodingFailed(format!("failed to open image: {}", e)))?;

    let orientation = decoder
        .orientation()
        .map_err(|e| CaptureError::EncodingFailed(format!("failed to read orientation: {}", e)))?;

    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|e| CaptureError::EncodingFailed(format!("failed to decode image: {}", e)))?;
    image.apply_orientation(orientation);

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CaptureError::EncodingFailed(format!("failed to encode jpeg: {}", e)))?;

    log::debug!(
        "Normalized photo {}x{} ({:?}), {} -> {} bytes",
        rgb.width(),
        rgb.height(),
        orientation,
        data.len(),
        encoded.len()
    );
    Ok(encoded)
}

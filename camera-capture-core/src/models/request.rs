use std::sync::atomic::{AtomicU64, Ordering};

use super::camera::{FlashMode, VideoOrientation};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Still-image container format requested from the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PhotoCodec {
    #[default]
    Jpeg,
}

/// Settings for one still-image capture.
///
/// Built per shutter press and consumed by the backend. Each request gets a
/// fresh `id`; hardware rejects reused settings objects.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub id: u64,
    pub codec: PhotoCodec,
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
    pub flash_mode: FlashMode,
    pub orientation: VideoOrientation,
}

impl CaptureRequest {
    pub fn new(quality: f32, flash_mode: FlashMode, orientation: VideoOrientation) -> Self {
        Self {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            codec: PhotoCodec::Jpeg,
            quality,
            flash_mode,
            orientation,
        }
    }

    /// Copy codec and quality from a previous request, with a new id and the
    /// given flash mode and orientation.
    pub fn derive_from(&self, flash_mode: FlashMode, orientation: VideoOrientation) -> Self {
        Self {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            codec: self.codec,
            quality: self.quality,
            flash_mode,
            orientation,
        }
    }

    /// Downgrade the flash to `Off` when the hardware can't honor it right now.
    pub fn restrict_flash(&mut self, supported: &[FlashMode]) {
        if !supported.contains(&self.flash_mode) {
            self.flash_mode = FlashMode::Off;
        }
    }
}

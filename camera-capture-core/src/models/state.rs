use super::camera::{CameraFacing, FlashMode};
use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → configuring → running ↔ stopped
///             │
///             ├→ unauthorized   (permission denied or restricted)
///             └→ failed         (no usable camera device)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Configuring,
    Running,
    Stopped,
    Unauthorized,
    Failed(CaptureError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Snapshot of the controller as the UI sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Facing of the attached camera.
    pub facing: CameraFacing,
    /// Flash mode most recently requested by the UI.
    pub flash_mode: FlashMode,
    /// The attached camera has a usable flash.
    pub has_flash: bool,
    pub supported_flash_modes: Vec<FlashMode>,
    pub has_front_camera: bool,
}

impl SessionStatus {
    pub(crate) fn new(facing: CameraFacing) -> Self {
        Self {
            state: SessionState::Idle,
            facing,
            flash_mode: FlashMode::default(),
            has_flash: false,
            supported_flash_modes: Vec::new(),
            has_front_camera: false,
        }
    }
}

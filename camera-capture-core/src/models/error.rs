use thiserror::Error;

/// Errors that can occur while driving the camera or persisting captures.
///
/// None of these are fatal to the process. Hardware and permission errors
/// reach the UI through [`CaptureDelegate::on_capture_failed`]; storage errors
/// are carried in the asset store completions.
///
/// [`CaptureDelegate::on_capture_failed`]: crate::CaptureDelegate::on_capture_failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("hardware configuration failed: {0}")]
    HardwareConfigurationFailed(String),

    #[error("device lock failed: {0}")]
    DeviceLockFailed(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("disk write failed: {0}")]
    DiskWriteFailed(String),

    #[error("disk delete failed: {0}")]
    DiskDeleteFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Whether this error came from the storage side of the pipeline.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::EncodingFailed(_) | Self::DiskWriteFailed(_) | Self::DiskDeleteFailed(_)
        )
    }
}

use std::sync::Arc;

use crate::models::camera::{AuthorizationStatus, CameraDevice, DeviceInput, FlashMode, FocusMode, FocusPoint};
use crate::models::error::CaptureError;
use crate::models::frame::VideoFrame;
use crate::models::request::CaptureRequest;

/// Callback invoked for every preview frame from the video output.
///
/// Fires on the backend's own sample-buffer thread. Late frames are discarded
/// by the backend rather than queued, so keep the work done here minimal.
pub type FrameCallback = Arc<dyn Fn(&VideoFrame) + Send + Sync + 'static>;

/// Completion for one still-image capture: encoded image bytes or the failure.
pub type PhotoCompletion = Box<dyn FnOnce(Result<Vec<u8>, CaptureError>) + Send + 'static>;

/// Interface to the platform camera hardware session.
///
/// The controller calls every method from its capture worker queue, never
/// concurrently. Implemented by:
/// - `VirtualCamera` (synthetic frames and stills)
/// - Future: platform camera stacks
pub trait CameraBackend: Send + 'static {
    /// Current camera permission.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for camera access. One round trip; blocks until answered.
    fn request_access(&mut self) -> bool;

    /// Every camera the hardware exposes, default device first.
    fn devices(&self) -> Vec<CameraDevice>;

    /// Construct an input for `device`. Does not attach it.
    fn open_input(&mut self, device: &CameraDevice) -> Result<DeviceInput, CaptureError>;

    /// Attach an input to the session.
    fn add_input(&mut self, input: &DeviceInput) -> Result<(), CaptureError>;

    /// Detach an input. Unknown ids are ignored.
    fn remove_input(&mut self, input_id: u64);

    /// Inputs currently attached to the session.
    fn inputs(&self) -> Vec<DeviceInput>;

    /// Attach the still-photo output and the preview video output.
    fn attach_outputs(&mut self, frames: FrameCallback) -> Result<(), CaptureError>;

    /// Flash modes the photo output accepts for the attached device.
    fn supported_flash_modes(&self) -> Vec<FlashMode>;

    /// Lock the active device and set its focus mode.
    fn set_focus_mode(&mut self, mode: FocusMode, smooth: bool) -> Result<(), CaptureError>;

    /// Lock the active device and focus once at `point`.
    fn focus_at(&mut self, point: FocusPoint) -> Result<(), CaptureError>;

    fn start_running(&mut self) -> Result<(), CaptureError>;

    /// Stop the session. Returns only after the completion of every capture
    /// accepted before the call has run.
    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Issue a still capture. `completion` must be called exactly once, from
    /// any thread, and completions must run in request order.
    fn capture_photo(&mut self, request: &CaptureRequest, completion: PhotoCompletion);
}

use crate::models::error::CaptureError;
use crate::models::lighting::LightingCondition;
use crate::models::state::SessionState;

/// Event delegate for capture session notifications.
///
/// Every method runs on the UI thread: the controller posts each call to its
/// [`MainContext`](crate::MainContext). The controller only keeps a weak
/// reference, so dropping the last `Arc` silences all further events.
pub trait CaptureDelegate: Send + Sync {
    /// A still image finished processing. `data` is the encoded photo.
    fn on_image_captured(&self, data: &[u8]);

    /// A throttled preview sample was classified.
    fn on_lighting_changed(&self, condition: LightingCondition);

    /// A permission, configuration, device lock or capture error.
    fn on_capture_failed(&self, error: &CaptureError);

    /// The session moved to a new state.
    fn on_state_changed(&self, _state: &SessionState) {}
}

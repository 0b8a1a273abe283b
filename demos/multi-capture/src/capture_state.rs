use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use camera_capture_core::{
    AssetStore, CameraFacing, CaptureDelegate, CaptureError, FlashMode, LightingCondition, SessionDiagnostics,
    SessionState, StoredAsset,
};

use crate::roll::CaptureRoll;

/// What the capture screen shows. Touched only on the main thread.
#[derive(Default)]
pub struct ScreenModel {
    pub roll: CaptureRoll,
    /// Shutter presses answered with an image or a capture failure.
    pub shots_settled: u64,
    /// Images handed to the store whose write hasn't completed yet.
    pub pending_writes: usize,
    pub lighting: Option<LightingCondition>,
    pub state: Option<SessionState>,
    pub errors: Vec<String>,
}

/// CaptureDelegate that saves every captured image and keeps the screen model
/// in sync with the session.
pub struct ScreenDelegate {
    store: Arc<AssetStore>,
    model: Arc<Mutex<ScreenModel>>,
}

impl ScreenDelegate {
    pub fn new(store: Arc<AssetStore>, model: Arc<Mutex<ScreenModel>>) -> Arc<Self> {
        Arc::new(Self { store, model })
    }
}

impl CaptureDelegate for ScreenDelegate {
    fn on_image_captured(&self, data: &[u8]) {
        {
            let mut model = self.model.lock();
            model.shots_settled += 1;
            model.pending_writes += 1;
        }

        let model = Arc::clone(&self.model);
        self.store.create_asset(data.to_vec(), move |result| {
            let mut model = model.lock();
            model.pending_writes -= 1;
            match result {
                Ok(asset) => {
                    log::info!("Saved {} ({} bytes)", asset.file_name, asset.byte_len);
                    model.roll.push(asset);
                }
                Err(e) => {
                    log::error!("Failed to save capture: {}", e);
                    model.errors.push(e.to_string());
                }
            }
        });
    }

    fn on_lighting_changed(&self, condition: LightingCondition) {
        let mut model = self.model.lock();
        if model.lighting != Some(condition) {
            log::info!("Lighting: {:?}{}", condition, if condition.suggests_flash() { " (flash suggested)" } else { "" });
        }
        model.lighting = Some(condition);
    }

    fn on_capture_failed(&self, error: &CaptureError) {
        log::warn!("Capture error: {}", error);
        let mut model = self.model.lock();
        if matches!(error, CaptureError::CaptureFailed(_)) {
            model.shots_settled += 1;
        }
        model.errors.push(error.to_string());
    }

    fn on_state_changed(&self, state: &SessionState) {
        log::debug!("Session state: {:?}", state);
        self.model.lock().state = Some(state.clone());
    }
}

// -- Manifest payloads --

/// One roll entry as handed back to the caller.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub position: usize,
    pub file_path: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub created_at: String,
}

impl AssetInfo {
    pub fn new(position: usize, asset: &StoredAsset) -> Self {
        Self {
            position,
            file_path: asset.path.to_string_lossy().to_string(),
            file_name: asset.file_name.clone(),
            size_bytes: asset.byte_len,
            checksum: asset.checksum.clone(),
            created_at: asset.created_at.to_rfc3339(),
        }
    }
}

/// Serializable diagnostics snapshot.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsInfo {
    pub captures_requested: u64,
    pub images_delivered: u64,
    pub capture_failures: u64,
    pub frames_received: u64,
    pub lighting_samples: u64,
    pub orphaned_completions: u64,
}

impl From<SessionDiagnostics> for DiagnosticsInfo {
    fn from(d: SessionDiagnostics) -> Self {
        Self {
            captures_requested: d.captures_requested,
            images_delivered: d.images_delivered,
            capture_failures: d.capture_failures,
            frames_received: d.frames_received,
            lighting_samples: d.lighting_samples,
            orphaned_completions: d.orphaned_completions,
        }
    }
}

/// Everything the capture screen returns when it closes.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub session_directory: String,
    pub facing: CameraFacing,
    pub flash_mode: FlashMode,
    pub lighting: Option<LightingCondition>,
    pub items: Vec<AssetInfo>,
    pub errors: Vec<String>,
    pub diagnostics: DiagnosticsInfo,
}

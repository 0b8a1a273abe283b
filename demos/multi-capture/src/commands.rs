use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use camera_capture_core::{
    AssetStore, CaptureSessionController, FlashMode, LightingCondition, MainQueue, PrepareOutcome,
    SessionConfiguration, StoreConfiguration,
};
use camera_capture_virtual::{CameraProbe, Scene, VirtualCamera};

use crate::capture_state::{AssetInfo, Manifest, ScreenDelegate, ScreenModel};

/// How long the UI waits on the core before giving up on a step.
const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// The multi-capture screen: session, store and roll, driven from the main thread.
pub struct CaptureScreen {
    main: Arc<MainQueue>,
    store: Arc<AssetStore>,
    controller: CaptureSessionController<VirtualCamera>,
    probe: CameraProbe,
    model: Arc<Mutex<ScreenModel>>,
    // The controller only holds a weak reference.
    _delegate: Arc<ScreenDelegate>,
}

impl CaptureScreen {
    /// Open the screen with a fresh asset directory under `caches_root`.
    pub fn open(caches_root: PathBuf, camera: VirtualCamera) -> Result<Self, String> {
        let main = Arc::new(MainQueue::new());
        let store = AssetStore::new(StoreConfiguration::with_caches_root(caches_root), main.clone())
            .map(Arc::new)
            .map_err(|e| e.to_string())?;

        let probe = camera.probe();
        let controller = CaptureSessionController::new(camera, SessionConfiguration::default(), main.clone())
            .map_err(|e| e.to_string())?;

        let model = Arc::new(Mutex::new(ScreenModel::default()));
        let delegate = ScreenDelegate::new(Arc::clone(&store), Arc::clone(&model));
        controller.set_delegate(delegate.clone());

        Ok(Self {
            main,
            store,
            controller,
            probe,
            model,
            _delegate: delegate,
        })
    }

    pub fn prepare(&self) -> Result<PrepareOutcome, String> {
        let slot = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        self.controller.prepare(move |outcome| *out.lock() = Some(outcome));
        self.wait("camera setup", || slot.lock().is_some())?;
        let outcome = slot.lock().take().ok_or("camera setup completed without an outcome")?;
        Ok(outcome)
    }

    /// Press the shutter `count` times as fast as possible and wait until every
    /// resulting image is on disk.
    pub fn capture_burst(&self, count: usize) -> Result<(), String> {
        let target = self.model.lock().shots_settled + count as u64;
        for _ in 0..count {
            self.controller.capture_still_image();
        }
        self.wait("captures", || self.model.lock().shots_settled >= target)?;
        self.wait("asset writes", || self.model.lock().pending_writes == 0)
    }

    /// Tap the flash button once. `None` when the camera has no flash.
    pub fn cycle_flash(&self) -> Result<Option<FlashMode>, String> {
        let Some(next) = self.controller.next_supported_flash_mode() else {
            return Ok(None);
        };
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        self.controller.set_flash_mode(next, move || flag.store(true, Ordering::SeqCst));
        self.wait("flash change", || done.load(Ordering::SeqCst))?;
        log::info!("Flash: {:?}", next);
        Ok(Some(next))
    }

    /// Tap the flash button until it shows `mode`.
    pub fn select_flash(&self, mode: FlashMode) -> Result<bool, String> {
        for _ in 0..FlashMode::CYCLE.len() {
            if self.controller.status().flash_mode == mode {
                return Ok(true);
            }
            if self.cycle_flash()?.is_none() {
                return Ok(false);
            }
        }
        Ok(self.controller.status().flash_mode == mode)
    }

    /// Toggle between the front and back camera.
    pub fn switch_camera(&self) -> Result<(), String> {
        let status = self.controller.status();
        if !status.has_front_camera {
            log::info!("No front camera to switch to");
            return Ok(());
        }
        let target = status.facing.opposite();
        self.controller.set_camera_facing(target);
        // Switching reports nothing on success; a flash change round-trips the worker.
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        self.controller
            .set_flash_mode(self.controller.status().flash_mode, move || flag.store(true, Ordering::SeqCst));
        self.wait("camera switch", || done.load(Ordering::SeqCst))?;
        log::info!("Camera: {:?}", self.controller.status().facing);
        Ok(())
    }

    /// Point the camera at `scene` and wait for the lighting readout to match.
    pub fn look_at(&self, scene: Scene, expect: LightingCondition) -> Result<(), String> {
        self.probe.set_scene(scene);
        self.wait("lighting change", || self.model.lock().lighting == Some(expect))
    }

    /// Delete the thumbnail at `index`: out of the roll first, then off the disk.
    pub fn delete_item(&self, index: usize) -> Result<(), String> {
        let asset = self
            .model
            .lock()
            .roll
            .remove(index)
            .ok_or_else(|| format!("no item at {}", index))?;

        let slot = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        self.store.delete_asset(asset.path.clone(), move |result| *out.lock() = Some(result));
        self.wait("delete", || slot.lock().is_some())?;
        if let Some(Err(e)) = slot.lock().take() {
            log::warn!("Could not delete {}: {}", asset.file_name, e);
        }
        Ok(())
    }

    pub fn move_item(&self, from: usize, to: usize) -> Result<(), String> {
        if self.model.lock().roll.move_item(from, to) {
            Ok(())
        } else {
            Err(format!("cannot move item {} to {}", from, to))
        }
    }

    pub fn roll_len(&self) -> usize {
        self.model.lock().roll.len()
    }

    /// Close the screen: stop the camera and hand the roll back.
    pub fn close(self) -> Result<Manifest, String> {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        self.controller.stop(move || flag.store(true, Ordering::SeqCst));
        self.wait("camera stop", || done.load(Ordering::SeqCst))?;
        self.wait("asset writes", || self.model.lock().pending_writes == 0)?;

        let status = self.controller.status();
        let model = self.model.lock();
        Ok(Manifest {
            session_directory: self.store.directory().to_string_lossy().to_string(),
            facing: status.facing,
            flash_mode: status.flash_mode,
            lighting: model.lighting,
            items: model
                .roll
                .items()
                .iter()
                .enumerate()
                .map(|(position, asset)| AssetInfo::new(position, asset))
                .collect(),
            errors: model.errors.clone(),
            diagnostics: self.controller.diagnostics().into(),
        })
    }

    /// Run main-thread tasks until `done` holds.
    fn wait<F>(&self, what: &str, done: F) -> Result<(), String>
    where
        F: FnMut() -> bool,
    {
        if self.main.run_until(STEP_TIMEOUT, done) {
            Ok(())
        } else {
            Err(format!("timed out waiting for {}", what))
        }
    }
}

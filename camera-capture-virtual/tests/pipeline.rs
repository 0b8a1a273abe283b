//! Camera to disk: virtual hardware, session controller and asset store wired
//! together the way a capture screen wires them.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tempfile::TempDir;

use camera_capture_core::{
    AssetStore, CameraFacing, CaptureDelegate, CaptureError, CaptureSessionController, FlashMode, LightingCondition,
    MainQueue, PrepareOutcome, SessionConfiguration, StoreConfiguration, StoredAsset,
};
use camera_capture_virtual::{CameraProbe, DeviceCatalog, Scene, ScriptedPermissions, VirtualCamera, VirtualCameraOptions};

const WAIT: Duration = Duration::from_secs(10);
const QUIET: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Image,
    Failed(CaptureError),
}

/// Plays the capture screen: saves every image through the store.
struct Screen {
    store: Arc<AssetStore>,
    outcomes: Mutex<Vec<Outcome>>,
    lighting: Mutex<Vec<LightingCondition>>,
    saved: Arc<Mutex<Vec<Result<StoredAsset, CaptureError>>>>,
}

impl CaptureDelegate for Screen {
    fn on_image_captured(&self, data: &[u8]) {
        self.outcomes.lock().push(Outcome::Image);
        let saved = Arc::clone(&self.saved);
        self.store
            .create_asset(data.to_vec(), move |result| saved.lock().push(result));
    }

    fn on_lighting_changed(&self, condition: LightingCondition) {
        self.lighting.lock().push(condition);
    }

    fn on_capture_failed(&self, error: &CaptureError) {
        self.outcomes.lock().push(Outcome::Failed(error.clone()));
    }
}

impl Screen {
    fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().clone()
    }

    fn saved(&self) -> Vec<StoredAsset> {
        self.saved
            .lock()
            .iter()
            .map(|result| result.clone().expect("asset write failed"))
            .collect()
    }
}

struct Pipeline {
    controller: CaptureSessionController<VirtualCamera>,
    probe: CameraProbe,
    screen: Arc<Screen>,
    store: Arc<AssetStore>,
    main: Arc<MainQueue>,
    _root: TempDir,
}

fn fast_options() -> VirtualCameraOptions {
    VirtualCameraOptions {
        preview_size: (96, 72),
        frame_rate: 60,
        still_size: (160, 120),
        still_latency: Duration::from_millis(5),
    }
}

fn pipeline(camera: VirtualCamera) -> Pipeline {
    let root = tempfile::tempdir().unwrap();
    let main = Arc::new(MainQueue::new());
    let store = Arc::new(AssetStore::new(StoreConfiguration::with_caches_root(root.path()), main.clone()).unwrap());

    let camera = camera.with_options(fast_options());
    let probe = camera.probe();
    let controller = CaptureSessionController::new(camera, SessionConfiguration::default(), main.clone()).unwrap();

    let screen = Arc::new(Screen {
        store: Arc::clone(&store),
        outcomes: Mutex::new(Vec::new()),
        lighting: Mutex::new(Vec::new()),
        saved: Arc::new(Mutex::new(Vec::new())),
    });
    controller.set_delegate(screen.clone());

    Pipeline {
        controller,
        probe,
        screen,
        store,
        main,
        _root: root,
    }
}

impl Pipeline {
    fn prepare(&self) -> PrepareOutcome {
        let slot = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        self.controller.prepare(move |outcome| *out.lock() = Some(outcome));
        assert!(self.main.run_until(WAIT, || slot.lock().is_some()));
        let outcome = slot.lock().take().unwrap();
        outcome
    }

    fn stop(&self) {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        self.controller.stop(move || flag.store(true, Ordering::SeqCst));
        assert!(self.main.run_until(WAIT, || done.load(Ordering::SeqCst)));
    }

    fn set_flash(&self, mode: FlashMode) {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        self.controller.set_flash_mode(mode, move || flag.store(true, Ordering::SeqCst));
        assert!(self.main.run_until(WAIT, || done.load(Ordering::SeqCst)));
    }

    fn delete(&self, path: PathBuf) -> Result<(), CaptureError> {
        let slot = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        self.store.delete_asset(path, move |result| *out.lock() = Some(result));
        assert!(self.main.run_until(WAIT, || slot.lock().is_some()));
        let result = slot.lock().take().unwrap();
        result
    }

    fn listing(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(self.store.directory()) {
            Ok(entries) => entries
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

#[test]
fn burst_is_saved_without_collisions() {
    let p = pipeline(VirtualCamera::builtin());
    assert_eq!(p.prepare(), PrepareOutcome::Authorized);

    for _ in 0..3 {
        p.controller.capture_still_image();
    }
    assert!(p.main.run_until(WAIT, || p.screen.saved.lock().len() == 3));

    let saved = p.screen.saved();
    let mut names: Vec<&str> = saved.iter().map(|a| a.file_name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 3);
    assert_eq!(p.listing().len(), 3);

    for asset in &saved {
        assert!(asset.path.starts_with(p.store.directory()));
        assert_eq!(fs::metadata(&asset.path).unwrap().len(), asset.byte_len);
        let image = image::open(&asset.path).unwrap();
        // Default capture orientation is portrait.
        assert_eq!((image.width(), image.height()), (120, 160));
    }
}

#[test]
fn delete_after_create_leaves_directory_empty() {
    let p = pipeline(VirtualCamera::builtin());
    p.prepare();

    p.controller.capture_still_image();
    assert!(p.main.run_until(WAIT, || p.screen.saved.lock().len() == 1));
    let asset = p.screen.saved().remove(0);
    assert_eq!(p.listing(), vec![asset.file_name.clone()]);

    p.delete(asset.path.clone()).unwrap();
    assert!(!asset.path.exists());
    assert!(p.listing().is_empty());
}

#[test]
fn stop_delivers_queued_captures_then_nothing() {
    let p = pipeline(VirtualCamera::builtin());
    p.prepare();

    p.controller.capture_still_image();
    p.controller.capture_still_image();
    p.stop();
    assert_eq!(p.screen.outcomes(), vec![Outcome::Image, Outcome::Image]);
    assert!(!p.probe.is_running());

    p.controller.capture_still_image();
    assert!(p.main.run_until(WAIT, || p.screen.outcomes().len() == 3));
    p.main.run_for_quiet(QUIET);

    let outcomes = p.screen.outcomes();
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[2], Outcome::Failed(CaptureError::CaptureFailed(_))));
    assert_eq!(p.probe.captures_issued(), 2);
    assert_eq!(p.controller.diagnostics().orphaned_completions, 0);
}

#[test]
fn injected_failures_keep_event_order() {
    let p = pipeline(VirtualCamera::builtin().with_failing_captures(2));
    p.prepare();

    for _ in 0..3 {
        p.controller.capture_still_image();
    }
    assert!(p.main.run_until(WAIT, || p.screen.outcomes().len() == 3));

    let outcomes = p.screen.outcomes();
    assert_eq!(outcomes[0], Outcome::Image);
    assert!(matches!(outcomes[1], Outcome::Failed(CaptureError::CaptureFailed(_))));
    assert_eq!(outcomes[2], Outcome::Image);
}

#[test]
fn lighting_tracks_the_scene_at_one_hertz() {
    let p = pipeline(VirtualCamera::builtin().with_scene(Scene::backlit()));
    let started = Instant::now();
    p.prepare();

    assert!(p
        .main
        .run_until(WAIT, || p.screen.lighting.lock().contains(&LightingCondition::Backlit)));

    p.probe.set_scene(Scene::dim());
    assert!(p
        .main
        .run_until(WAIT, || p.screen.lighting.lock().contains(&LightingCondition::LowLight)));
    p.stop();

    let samples = p.screen.lighting.lock().len() as u64;
    let window = started.elapsed().as_secs() + 1;
    assert!(samples <= window, "{} samples in {} s", samples, window);
    assert!(p.probe.frames_emitted() > samples);
}

#[test]
fn denied_permission_never_touches_hardware() {
    let p = pipeline(VirtualCamera::new(DeviceCatalog::builtin(), ScriptedPermissions::denied()));
    assert_eq!(p.prepare(), PrepareOutcome::Denied);
    p.main.run_for_quiet(QUIET);

    assert!(p.probe.current_inputs().is_empty());
    assert!(!p.probe.is_running());
    assert_eq!(p.screen.outcomes(), vec![Outcome::Failed(CaptureError::PermissionDenied)]);
}

#[test]
fn prompt_grants_access_once() {
    let p = pipeline(VirtualCamera::new(DeviceCatalog::builtin(), ScriptedPermissions::undetermined(true)));
    assert_eq!(p.prepare(), PrepareOutcome::PendingThenAuthorized);
    assert!(p.probe.is_running());

    p.stop();
    assert_eq!(p.prepare(), PrepareOutcome::Authorized);
}

#[test]
fn front_camera_has_no_flash() {
    let p = pipeline(VirtualCamera::builtin());
    p.prepare();
    p.set_flash(FlashMode::On);
    assert_eq!(p.controller.next_supported_flash_mode(), Some(FlashMode::Off));

    p.controller.set_camera_facing(CameraFacing::Front);
    p.controller.capture_still_image();
    assert!(p.main.run_until(WAIT, || p.screen.outcomes().len() == 1));

    let status = p.controller.status();
    assert_eq!(status.facing, CameraFacing::Front);
    assert!(!status.has_flash);
    assert_eq!(p.controller.next_supported_flash_mode(), None);
    assert_eq!(p.probe.last_request().unwrap().flash_mode, FlashMode::Off);
    assert_eq!(p.probe.flash_fired(), 0);
    assert_eq!(p.probe.inputs_removed(), 1);
}

#[test]
fn broken_front_camera_keeps_back_input() {
    let p = pipeline(VirtualCamera::builtin().with_broken_input(CameraFacing::Front));
    p.prepare();
    let before = p.probe.current_inputs();

    p.controller.set_camera_facing(CameraFacing::Front);
    assert!(p.main.run_until(WAIT, || !p.screen.outcomes().is_empty()));

    assert!(matches!(
        p.screen.outcomes()[0],
        Outcome::Failed(CaptureError::HardwareConfigurationFailed(_))
    ));
    assert_eq!(p.probe.current_inputs(), before);
    assert_eq!(p.controller.status().facing, CameraFacing::Back);

    p.controller.capture_still_image();
    assert!(p.main.run_until(WAIT, || p.screen.outcomes().len() == 2));
    assert_eq!(p.screen.outcomes()[1], Outcome::Image);
}

#[test]
fn session_without_cameras_fails() {
    let p = pipeline(VirtualCamera::new(DeviceCatalog::empty(), ScriptedPermissions::authorized()));
    assert_eq!(p.prepare(), PrepareOutcome::Authorized);
    assert!(matches!(
        p.controller.state(),
        camera_capture_core::SessionState::Failed(CaptureError::HardwareConfigurationFailed(_))
    ));
}

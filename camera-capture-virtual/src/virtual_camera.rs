//! Synthetic camera hardware session.
//!
//! Runs two threads while the session is running:
//! - `virtual-camera-frames` renders the current [`Scene`] into BGRA preview
//!   frames at the configured rate and hands them to the frame callback
//! - `virtual-camera-photos` renders still photos as JPEG, one job at a time in
//!   the order they were issued
//!
//! Faults can be injected for tests and demos: inputs that can't be opened for
//! a given facing, every Nth capture failing, and focus lock failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, SendError, Sender};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use parking_lot::Mutex;

use camera_capture_core::{
    AuthorizationStatus, CameraBackend, CameraDevice, CameraFacing, CaptureError, CaptureRequest, DeviceInput,
    FlashMode, FocusMode, FocusPoint, FrameCallback, PhotoCompletion, VideoFrame, VideoOrientation,
};

use crate::device_catalog::DeviceCatalog;
use crate::permissions::ScriptedPermissions;
use crate::scene::Scene;

/// Frame and photo geometry and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualCameraOptions {
    /// Preview frame size, landscape.
    pub preview_size: (u32, u32),
    /// Preview frames per second.
    pub frame_rate: u32,
    /// Still photo size, landscape. Portrait captures swap the dimensions.
    pub still_size: (u32, u32),
    /// Simulated exposure and processing time per photo.
    pub still_latency: Duration,
}

impl Default for VirtualCameraOptions {
    fn default() -> Self {
        Self {
            preview_size: (192, 144),
            frame_rate: 30,
            still_size: (640, 480),
            still_latency: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Faults {
    broken_facing: Option<CameraFacing>,
    fail_every: Option<u64>,
    focus_lock_fails: bool,
}

#[derive(Debug, Default)]
struct ProbeState {
    inputs_added: usize,
    inputs_removed: usize,
    current_inputs: Vec<DeviceInput>,
    last_request: Option<CaptureRequest>,
    captures_issued: u64,
    photos_rendered: u64,
    flash_fired: u64,
    frames_emitted: u64,
    focus_mode: Option<FocusMode>,
    focus_point: Option<FocusPoint>,
    running: bool,
}

/// Observes a [`VirtualCamera`] after it has been handed to a controller, and
/// changes the scene it films.
#[derive(Clone)]
pub struct CameraProbe {
    state: Arc<Mutex<ProbeState>>,
    scene: Arc<Mutex<Scene>>,
}

impl CameraProbe {
    pub fn inputs_added(&self) -> usize {
        self.state.lock().inputs_added
    }

    pub fn inputs_removed(&self) -> usize {
        self.state.lock().inputs_removed
    }

    pub fn current_inputs(&self) -> Vec<DeviceInput> {
        self.state.lock().current_inputs.clone()
    }

    pub fn last_request(&self) -> Option<CaptureRequest> {
        self.state.lock().last_request.clone()
    }

    pub fn captures_issued(&self) -> u64 {
        self.state.lock().captures_issued
    }

    pub fn photos_rendered(&self) -> u64 {
        self.state.lock().photos_rendered
    }

    /// Photos taken with the flash firing.
    pub fn flash_fired(&self) -> u64 {
        self.state.lock().flash_fired
    }

    pub fn frames_emitted(&self) -> u64 {
        self.state.lock().frames_emitted
    }

    pub fn focus_mode(&self) -> Option<FocusMode> {
        self.state.lock().focus_mode
    }

    pub fn focus_point(&self) -> Option<FocusPoint> {
        self.state.lock().focus_point
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn scene(&self) -> Scene {
        *self.scene.lock()
    }

    /// Point the camera at `scene`. Takes effect from the next frame or photo.
    pub fn set_scene(&self, scene: Scene) {
        *self.scene.lock() = scene;
    }
}

struct FrameWorker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct PhotoWorker {
    jobs: Sender<PhotoJob>,
    handle: JoinHandle<()>,
}

struct PhotoJob {
    request: CaptureRequest,
    mirrored: bool,
    flash_fires: bool,
    fail: bool,
    completion: PhotoCompletion,
}

/// A [`CameraBackend`] that films a synthetic [`Scene`].
pub struct VirtualCamera {
    catalog: DeviceCatalog,
    permissions: ScriptedPermissions,
    options: VirtualCameraOptions,
    faults: Faults,
    inputs: Vec<DeviceInput>,
    next_input_id: u64,
    frame_callback: Option<FrameCallback>,
    frames: Option<FrameWorker>,
    photos: Option<PhotoWorker>,
    probe: CameraProbe,
}

impl VirtualCamera {
    pub fn new(catalog: DeviceCatalog, permissions: ScriptedPermissions) -> Self {
        Self {
            catalog,
            permissions,
            options: VirtualCameraOptions::default(),
            faults: Faults::default(),
            inputs: Vec::new(),
            next_input_id: 1,
            frame_callback: None,
            frames: None,
            photos: None,
            probe: CameraProbe {
                state: Arc::new(Mutex::new(ProbeState::default())),
                scene: Arc::new(Mutex::new(Scene::default())),
            },
        }
    }

    /// Back and front camera, access already granted.
    pub fn builtin() -> Self {
        Self::new(DeviceCatalog::builtin(), ScriptedPermissions::authorized())
    }

    pub fn with_options(mut self, options: VirtualCameraOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_scene(self, scene: Scene) -> Self {
        self.probe.set_scene(scene);
        self
    }

    /// Opening an input for any `facing` camera fails.
    pub fn with_broken_input(mut self, facing: CameraFacing) -> Self {
        self.faults.broken_facing = Some(facing);
        self
    }

    /// Every `every`-th capture completes with `CaptureFailed`.
    pub fn with_failing_captures(mut self, every: u64) -> Self {
        self.faults.fail_every = Some(every).filter(|n| *n > 0);
        self
    }

    /// Every focus configuration fails to lock the device.
    pub fn with_focus_lock_failure(mut self) -> Self {
        self.faults.focus_lock_fails = true;
        self
    }

    pub fn probe(&self) -> CameraProbe {
        self.probe.clone()
    }

    fn active_device(&self) -> Option<CameraDevice> {
        let input = self.inputs.first()?;
        self.catalog.find(&input.device_id).cloned()
    }

    fn lock_device(&self) -> Result<CameraDevice, CaptureError> {
        let device = self
            .active_device()
            .ok_or_else(|| CaptureError::DeviceLockFailed("no active camera".into()))?;
        if self.faults.focus_lock_fails {
            return Err(CaptureError::DeviceLockFailed(format!("{} is busy", device.name)));
        }
        Ok(device)
    }

    fn sync_inputs(&self) {
        self.probe.state.lock().current_inputs = self.inputs.clone();
    }

    fn spawn_frames(&self, callback: FrameCallback) -> Result<FrameWorker, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let scene = Arc::clone(&self.probe.scene);
        let state = Arc::clone(&self.probe.state);
        let size = self.options.preview_size;
        let period = Duration::from_secs_f64(1.0 / f64::from(self.options.frame_rate.max(1)));

        let handle = thread::Builder::new()
            .name("virtual-camera-frames".into())
            .spawn(move || frame_loop(flag, callback, scene, state, size, period))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn frame thread: {}", e)))?;
        Ok(FrameWorker { running, handle })
    }

    fn spawn_photos(&self) -> Result<PhotoWorker, CaptureError> {
        let (jobs, receiver) = unbounded();
        let scene = Arc::clone(&self.probe.scene);
        let state = Arc::clone(&self.probe.state);
        let size = self.options.still_size;
        let latency = self.options.still_latency;

        let handle = thread::Builder::new()
            .name("virtual-camera-photos".into())
            .spawn(move || photo_loop(receiver, scene, state, size, latency))
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn photo thread: {}", e)))?;
        Ok(PhotoWorker { jobs, handle })
    }
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CameraBackend for VirtualCamera {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.permissions.status()
    }

    fn request_access(&mut self) -> bool {
        self.permissions.request()
    }

    fn devices(&self) -> Vec<CameraDevice> {
        self.catalog.devices().to_vec()
    }

    fn open_input(&mut self, device: &CameraDevice) -> Result<DeviceInput, CaptureError> {
        if self.catalog.find(&device.id).is_none() {
            return Err(CaptureError::HardwareConfigurationFailed(format!("unknown camera {}", device.id)));
        }
        if self.faults.broken_facing == Some(device.facing) {
            return Err(CaptureError::HardwareConfigurationFailed(format!(
                "cannot open input for {}",
                device.name
            )));
        }

        let input = DeviceInput {
            id: self.next_input_id,
            device_id: device.id.clone(),
            facing: device.facing,
        };
        self.next_input_id += 1;
        Ok(input)
    }

    fn add_input(&mut self, input: &DeviceInput) -> Result<(), CaptureError> {
        if self
            .inputs
            .iter()
            .any(|i| i.id == input.id || i.device_id == input.device_id)
        {
            return Err(CaptureError::HardwareConfigurationFailed(format!(
                "session already has an input for {}",
                input.device_id
            )));
        }
        self.inputs.push(input.clone());
        self.probe.state.lock().inputs_added += 1;
        self.sync_inputs();
        log::debug!("Added input {} ({})", input.id, input.device_id);
        Ok(())
    }

    fn remove_input(&mut self, input_id: u64) {
        let before = self.inputs.len();
        self.inputs.retain(|i| i.id != input_id);
        if self.inputs.len() != before {
            self.probe.state.lock().inputs_removed += 1;
            self.sync_inputs();
            log::debug!("Removed input {}", input_id);
        }
    }

    fn inputs(&self) -> Vec<DeviceInput> {
        self.inputs.clone()
    }

    fn attach_outputs(&mut self, frames: FrameCallback) -> Result<(), CaptureError> {
        if self.frame_callback.is_some() {
            return Err(CaptureError::HardwareConfigurationFailed("outputs already attached".into()));
        }
        self.frame_callback = Some(frames);
        Ok(())
    }

    fn supported_flash_modes(&self) -> Vec<FlashMode> {
        self.active_device()
            .map(|device| self.catalog.flash_modes_for(&device))
            .unwrap_or_default()
    }

    fn set_focus_mode(&mut self, mode: FocusMode, smooth: bool) -> Result<(), CaptureError> {
        let device = self.lock_device()?;
        if mode == FocusMode::ContinuousAutoFocus && !device.supports_continuous_autofocus {
            return Err(CaptureError::DeviceLockFailed(format!(
                "{} has no continuous autofocus",
                device.name
            )));
        }
        log::debug!("{} focus mode {:?} (smooth: {})", device.name, mode, smooth);
        self.probe.state.lock().focus_mode = Some(mode);
        Ok(())
    }

    fn focus_at(&mut self, point: FocusPoint) -> Result<(), CaptureError> {
        let device = self.lock_device()?;
        if !device.supports_focus_point {
            return Err(CaptureError::DeviceLockFailed(format!(
                "{} has no focus point of interest",
                device.name
            )));
        }
        let mut state = self.probe.state.lock();
        state.focus_point = Some(point);
        state.focus_mode = Some(FocusMode::AutoFocus);
        Ok(())
    }

    fn start_running(&mut self) -> Result<(), CaptureError> {
        if self.photos.is_some() {
            return Ok(());
        }

        let photos = self.spawn_photos()?;
        if let Some(callback) = self.frame_callback.clone() {
            self.frames = Some(self.spawn_frames(callback)?);
        }
        self.photos = Some(photos);
        self.probe.state.lock().running = true;
        log::info!("Virtual camera running");
        Ok(())
    }

    fn stop_running(&mut self) {
        if let Some(frames) = self.frames.take() {
            frames.running.store(false, Ordering::Release);
            if frames.handle.join().is_err() {
                log::warn!("Frame thread panicked");
            }
        }

        // Closing the job channel lets the photo thread finish what's queued.
        if let Some(photos) = self.photos.take() {
            drop(photos.jobs);
            if photos.handle.join().is_err() {
                log::warn!("Photo thread panicked");
            }
        }

        let was_running = std::mem::replace(&mut self.probe.state.lock().running, false);
        if was_running {
            log::info!("Virtual camera stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.photos.is_some()
    }

    fn capture_photo(&mut self, request: &CaptureRequest, completion: PhotoCompletion) {
        let issued = {
            let mut state = self.probe.state.lock();
            state.captures_issued += 1;
            state.last_request = Some(request.clone());
            state.captures_issued
        };

        let Some(photos) = &self.photos else {
            completion(Err(CaptureError::CaptureFailed("session is not running".into())));
            return;
        };
        let Some(device) = self.active_device() else {
            completion(Err(CaptureError::CaptureFailed("no active camera".into())));
            return;
        };

        let low_light = self.probe.scene().ambient_luma() < 0.2;
        let flash_fires = device.flash_usable()
            && match request.flash_mode {
                FlashMode::On => true,
                FlashMode::Auto => low_light,
                FlashMode::Off => false,
            };

        let job = PhotoJob {
            request: request.clone(),
            mirrored: device.facing == CameraFacing::Front,
            flash_fires,
            fail: self.faults.fail_every.is_some_and(|n| issued % n == 0),
            completion,
        };
        if let Err(SendError(job)) = photos.jobs.send(job) {
            (job.completion)(Err(CaptureError::CaptureFailed("photo output closed".into())));
        }
    }
}

impl Drop for VirtualCamera {
    fn drop(&mut self) {
        self.stop_running();
    }
}

fn frame_loop(
    running: Arc<AtomicBool>,
    callback: FrameCallback,
    scene: Arc<Mutex<Scene>>,
    state: Arc<Mutex<ProbeState>>,
    (width, height): (u32, u32),
    period: Duration,
) {
    let started = Instant::now();
    let mut deadline = started;

    while running.load(Ordering::Acquire) {
        let current = *scene.lock();
        let frame = VideoFrame::bgra(width, height, started.elapsed(), current.render_bgra(width, height));
        callback(&frame);
        state.lock().frames_emitted += 1;

        // A late frame is skipped, not queued.
        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }
}

fn photo_loop(
    jobs: Receiver<PhotoJob>,
    scene: Arc<Mutex<Scene>>,
    state: Arc<Mutex<ProbeState>>,
    size: (u32, u32),
    latency: Duration,
) {
    for job in jobs.iter() {
        thread::sleep(latency);

        let result = if job.fail {
            Err(CaptureError::CaptureFailed(format!(
                "sensor dropped photo {}",
                job.request.id
            )))
        } else {
            let current = *scene.lock();
            render_photo(current, &job, size)
        };

        if result.is_ok() {
            let mut state = state.lock();
            state.photos_rendered += 1;
            if job.flash_fires {
                state.flash_fired += 1;
            }
        }
        (job.completion)(result);
    }
}

fn render_photo(scene: Scene, job: &PhotoJob, (width, height): (u32, u32)) -> Result<Vec<u8>, CaptureError> {
    let lit = if job.flash_fires { scene.with_flash() } else { scene };
    let (width, height) = match job.request.orientation {
        VideoOrientation::Portrait | VideoOrientation::PortraitUpsideDown => (height, width),
        VideoOrientation::LandscapeLeft | VideoOrientation::LandscapeRight => (width, height),
    };
    let image = lit.render_still(width, height, job.mirrored);

    let quality = (job.request.quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality))
        .map_err(|e| CaptureError::CaptureFailed(format!("failed to encode photo {}: {}", job.request.id, e)))?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn request(flash_mode: FlashMode, orientation: VideoOrientation) -> CaptureRequest {
        CaptureRequest::new(0.9, flash_mode, orientation)
    }

    fn fast_options() -> VirtualCameraOptions {
        VirtualCameraOptions {
            preview_size: (48, 36),
            frame_rate: 100,
            still_size: (64, 48),
            still_latency: Duration::from_millis(1),
        }
    }

    fn running_camera(camera: VirtualCamera) -> VirtualCamera {
        let mut camera = camera.with_options(fast_options());
        let back = camera.devices()[0].clone();
        let input = camera.open_input(&back).unwrap();
        camera.add_input(&input).unwrap();
        camera.start_running().unwrap();
        camera
    }

    type Results = Arc<Mutex<Vec<(usize, Result<Vec<u8>, CaptureError>)>>>;

    fn capture(camera: &mut VirtualCamera, results: &Results, index: usize, req: CaptureRequest) {
        let out = Arc::clone(results);
        camera.capture_photo(&req, Box::new(move |result| out.lock().push((index, result))));
    }

    #[test]
    fn inputs_are_tracked_and_duplicates_rejected() {
        let mut camera = VirtualCamera::builtin();
        let probe = camera.probe();
        let back = camera.devices()[0].clone();

        let first = camera.open_input(&back).unwrap();
        let second = camera.open_input(&back).unwrap();
        assert_ne!(first.id, second.id);

        camera.add_input(&first).unwrap();
        assert!(camera.add_input(&second).is_err());
        assert_eq!(probe.current_inputs(), vec![first.clone()]);

        camera.remove_input(first.id);
        camera.remove_input(first.id);
        assert!(camera.inputs().is_empty());
        assert_eq!(probe.inputs_added(), 1);
        assert_eq!(probe.inputs_removed(), 1);
    }

    #[test]
    fn broken_facing_cannot_be_opened() {
        let mut camera = VirtualCamera::builtin().with_broken_input(CameraFacing::Front);
        let devices = camera.devices();
        assert!(camera.open_input(&devices[0]).is_ok());
        assert!(matches!(
            camera.open_input(&devices[1]),
            Err(CaptureError::HardwareConfigurationFailed(_))
        ));
    }

    #[test]
    fn capture_while_stopped_fails_immediately() {
        let mut camera = VirtualCamera::builtin();
        let results: Results = Arc::default();
        capture(&mut camera, &results, 0, request(FlashMode::Off, VideoOrientation::Portrait));

        let results = results.lock();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].1, Err(CaptureError::CaptureFailed(_))));
    }

    #[test]
    fn stop_drains_queued_photos_in_order() {
        let mut camera = running_camera(VirtualCamera::builtin().with_failing_captures(3));
        let results: Results = Arc::default();
        for index in 0..4 {
            capture(&mut camera, &results, index, request(FlashMode::Off, VideoOrientation::Portrait));
        }
        camera.stop_running();

        let results = results.lock();
        let order: Vec<usize> = results.iter().map(|(index, _)| *index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[2].1, Err(CaptureError::CaptureFailed(_))));
        assert!(results[3].1.is_ok());
        assert!(!camera.is_running());
    }

    #[test]
    fn portrait_photos_are_tall() {
        let mut camera = running_camera(VirtualCamera::builtin());
        let results: Results = Arc::default();
        capture(&mut camera, &results, 0, request(FlashMode::Off, VideoOrientation::Portrait));
        capture(&mut camera, &results, 1, request(FlashMode::Off, VideoOrientation::LandscapeLeft));
        camera.stop_running();

        let results = results.lock();
        let portrait = image::load_from_memory(results[0].1.as_ref().unwrap()).unwrap();
        let landscape = image::load_from_memory(results[1].1.as_ref().unwrap()).unwrap();
        assert_eq!(portrait.dimensions(), (48, 64));
        assert_eq!(landscape.dimensions(), (64, 48));
    }

    #[test]
    fn auto_flash_fires_only_in_low_light() {
        let mut camera = running_camera(VirtualCamera::builtin().with_scene(Scene::daylight()));
        let probe = camera.probe();
        let results: Results = Arc::default();

        capture(&mut camera, &results, 0, request(FlashMode::Auto, VideoOrientation::Portrait));
        probe.set_scene(Scene::dim());
        capture(&mut camera, &results, 1, request(FlashMode::Auto, VideoOrientation::Portrait));
        capture(&mut camera, &results, 2, request(FlashMode::Off, VideoOrientation::Portrait));
        camera.stop_running();

        assert_eq!(probe.photos_rendered(), 3);
        assert_eq!(probe.flash_fired(), 1);
    }

    #[test]
    fn frames_flow_while_running() {
        let mut camera = VirtualCamera::builtin().with_options(fast_options());
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&timestamps);
        camera
            .attach_outputs(Arc::new(move |frame: &VideoFrame| seen.lock().push(frame.timestamp)))
            .unwrap();
        assert!(camera.attach_outputs(Arc::new(|_: &VideoFrame| {})).is_err());

        camera.start_running().unwrap();
        thread::sleep(Duration::from_millis(100));
        camera.stop_running();

        let timestamps = timestamps.lock().clone();
        assert!(timestamps.len() >= 2);
        assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(camera.probe().frames_emitted(), timestamps.len() as u64);
    }

    #[test]
    fn focus_requires_point_support() {
        let mut camera = VirtualCamera::builtin();
        assert!(matches!(
            camera.focus_at(FocusPoint::center()),
            Err(CaptureError::DeviceLockFailed(_))
        ));

        let front = camera.devices()[1].clone();
        let input = camera.open_input(&front).unwrap();
        camera.add_input(&input).unwrap();
        assert!(camera.focus_at(FocusPoint::center()).is_err());
        assert!(camera.set_focus_mode(FocusMode::ContinuousAutoFocus, false).is_ok());
        assert_eq!(camera.probe().focus_mode(), Some(FocusMode::ContinuousAutoFocus));
    }
}

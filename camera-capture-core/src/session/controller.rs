use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::dispatch::main_queue::MainContext;
use crate::dispatch::post_if_alive;
use crate::dispatch::serial_queue::SerialQueue;
use crate::models::camera::{
    AuthorizationStatus, CameraDevice, CameraFacing, DeviceOrientation, FlashMode, FocusMode, FocusPoint,
    PrepareOutcome, VideoOrientation,
};
use crate::models::config::SessionConfiguration;
use crate::models::diagnostics::SessionDiagnostics;
use crate::models::error::CaptureError;
use crate::models::frame::VideoFrame;
use crate::models::request::CaptureRequest;
use crate::models::state::{SessionState, SessionStatus};
use crate::processing::lighting::LightingClassifier;
use crate::traits::camera_backend::{CameraBackend, FrameCallback};
use crate::traits::capture_delegate::CaptureDelegate;

/// Hardware-side state. Only ever locked from the capture worker queue.
struct Hardware<B: CameraBackend> {
    backend: B,
    configured: bool,
    outputs_attached: bool,
    device: Option<CameraDevice>,
    facing: CameraFacing,
    flash_mode: FlashMode,
    /// Settings of the last capture, used as the template for the next one.
    template: Option<CaptureRequest>,
}

/// Everything backend threads may touch. Holds no reference to the backend,
/// so a backend thread can never end up owning (and dropping) its own backend.
struct EventSink {
    main: Arc<dyn MainContext>,
    alive: Arc<AtomicBool>,
    delegate: Arc<Mutex<Option<Weak<dyn CaptureDelegate>>>>,
    status: Mutex<SessionStatus>,
    diagnostics: Mutex<SessionDiagnostics>,
    classifier: Mutex<LightingClassifier>,
    /// Cleared once `stop` has been processed; late photo completions are dropped.
    photos_open: AtomicBool,
}

struct Shared<B: CameraBackend> {
    config: SessionConfiguration,
    hardware: Mutex<Hardware<B>>,
    orientation: Mutex<VideoOrientation>,
    sink: Arc<EventSink>,
}

/// Owns the camera hardware session and drives it from a dedicated worker queue.
///
/// Every command returns immediately. Hardware work is serialized on the
/// `capture-session` queue in call order; results, events and completions are
/// posted to the [`MainContext`], each exactly once.
///
/// ```text
/// UI ──commands──▶ [capture-session queue] ──▶ CameraBackend
///                                                 │ photos, frames
/// UI ◀──events─── [MainContext] ◀── EventSink ◀───┘
/// ```
///
/// The UI must debounce the shutter: captures are neither coalesced nor
/// rejected while one is in flight.
pub struct CaptureSessionController<B: CameraBackend> {
    shared: Arc<Shared<B>>,
    queue: SerialQueue,
}

impl<B: CameraBackend> CaptureSessionController<B> {
    pub fn new(backend: B, config: SessionConfiguration, main: Arc<dyn MainContext>) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfiguration)?;

        let queue = SerialQueue::new("capture-session")?;
        let sink = Arc::new(EventSink {
            main,
            alive: Arc::new(AtomicBool::new(true)),
            delegate: Arc::new(Mutex::new(None)),
            status: Mutex::new(SessionStatus::new(config.initial_facing)),
            diagnostics: Mutex::new(SessionDiagnostics::default()),
            classifier: Mutex::new(LightingClassifier::new(config.sample_interval)),
            photos_open: AtomicBool::new(false),
        });

        let hardware = Hardware {
            backend,
            configured: false,
            outputs_attached: false,
            device: None,
            facing: config.initial_facing,
            flash_mode: FlashMode::default(),
            template: None,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                hardware: Mutex::new(hardware),
                orientation: Mutex::new(VideoOrientation::default()),
                sink,
            }),
            queue,
        })
    }

    /// Receive events through `delegate`. Only a weak reference is kept.
    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.shared.sink.delegate.lock() = Some(Arc::downgrade(&delegate));
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.sink.status.lock().clone()
    }

    pub fn state(&self) -> SessionState {
        self.shared.sink.status.lock().state.clone()
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.shared.sink.diagnostics.lock().clone()
    }

    /// Check camera permission, asking once if undetermined, then configure
    /// and start the hardware session.
    ///
    /// Denials leave the hardware untouched and also emit `PermissionDenied`.
    /// On a stopped session this restarts it.
    pub fn prepare<F>(&self, completion: F)
    where
        F: FnOnce(PrepareOutcome) + Send + 'static,
    {
        self.on_worker(move |shared| {
            let outcome = shared.authorize_and_configure();
            shared.sink.complete(move || completion(outcome));
        });
    }

    /// Switch to the camera facing `facing`.
    ///
    /// Ignored before configuration and when already on that camera. If the
    /// new input can't be attached, the previous input is restored.
    pub fn set_camera_facing(&self, facing: CameraFacing) {
        self.on_worker(move |shared| shared.switch_camera(facing));
    }

    /// Use `mode` for subsequent captures. Captures already queued keep the
    /// mode they were issued with.
    pub fn set_flash_mode<F>(&self, mode: FlashMode, completion: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.sink.status.lock().flash_mode = mode;
        self.on_worker(move |shared| {
            {
                let mut hw = shared.hardware.lock();
                let orientation = *shared.orientation.lock();
                hw.flash_mode = mode;
                hw.template = Some(shared.next_request(hw.template.as_ref(), mode, orientation));
            }
            shared.sink.complete(completion);
        });
    }

    /// The flash mode after the current one in off → auto → on order,
    /// restricted to what the camera supports. `None` without a usable flash.
    ///
    /// Does not change the mode; pass the result to [`set_flash_mode`](Self::set_flash_mode).
    pub fn next_supported_flash_mode(&self) -> Option<FlashMode> {
        let status = self.shared.sink.status.lock();
        if !status.has_flash {
            return None;
        }
        status.flash_mode.next_supported(&status.supported_flash_modes)
    }

    /// Take a still photo. The result arrives later as `on_image_captured`
    /// or `on_capture_failed`.
    pub fn capture_still_image(&self) {
        self.shared.sink.diagnostics.lock().captures_requested += 1;
        self.on_worker(|shared| shared.capture());
    }

    /// Focus once at `point`, if the camera supports a point of interest.
    pub fn focus_at(&self, point: FocusPoint) {
        self.on_worker(move |shared| {
            let mut hw = shared.hardware.lock();
            if !hw.device.as_ref().is_some_and(|d| d.supports_focus_point) {
                log::debug!("Focus point not supported by the active camera");
                return;
            }
            if let Err(e) = hw.backend.focus_at(point) {
                drop(hw);
                shared.sink.fail(e);
            }
        });
    }

    /// Rotation notification handler. Flat and unknown orientations keep the
    /// previous capture orientation.
    pub fn device_orientation_changed(&self, orientation: DeviceOrientation) {
        if let Some(video) = VideoOrientation::from_device(orientation) {
            *self.shared.orientation.lock() = video;
        }
    }

    /// Orientation the next capture will be issued with.
    pub fn capture_orientation(&self) -> VideoOrientation {
        *self.shared.orientation.lock()
    }

    /// Stop the hardware session.
    ///
    /// Captures queued before this call still run and deliver their results
    /// before `completion`. Nothing is delivered for captures after it.
    pub fn stop<F>(&self, completion: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_worker(move |shared| {
            {
                let mut hw = shared.hardware.lock();
                if hw.backend.is_running() {
                    hw.backend.stop_running();
                }
                shared.sink.photos_open.store(false, Ordering::SeqCst);
                if hw.configured {
                    shared.sink.set_state(SessionState::Stopped);
                }
            }
            log::info!("Capture session stopped");
            shared.sink.complete(completion);
        });
    }

    fn on_worker<F>(&self, task: F)
    where
        F: FnOnce(&Arc<Shared<B>>) + Send + 'static,
    {
        let weak = Arc::downgrade(&self.shared);
        self.queue.dispatch(move || {
            if let Some(shared) = weak.upgrade() {
                task(&shared);
            }
        });
    }
}

impl<B: CameraBackend> Drop for CaptureSessionController<B> {
    fn drop(&mut self) {
        self.shared.sink.alive.store(false, Ordering::Release);
    }
}

impl<B: CameraBackend> Shared<B> {
    fn authorize_and_configure(&self) -> PrepareOutcome {
        let mut hw = self.hardware.lock();

        let outcome = match hw.backend.authorization_status() {
            AuthorizationStatus::Authorized => PrepareOutcome::Authorized,
            AuthorizationStatus::Denied => PrepareOutcome::Denied,
            AuthorizationStatus::Restricted => PrepareOutcome::Restricted,
            AuthorizationStatus::NotDetermined => {
                log::info!("Requesting camera access");
                if hw.backend.request_access() {
                    PrepareOutcome::PendingThenAuthorized
                } else {
                    PrepareOutcome::PendingThenDenied
                }
            }
        };

        if !outcome.is_authorized() {
            log::warn!("Camera access not granted: {:?}", outcome);
            drop(hw);
            self.sink.set_state(SessionState::Unauthorized);
            self.sink.fail(CaptureError::PermissionDenied);
            return outcome;
        }

        self.configure_hardware(&mut hw);
        outcome
    }

    fn configure_hardware(&self, hw: &mut Hardware<B>) {
        if hw.configured {
            if !hw.backend.is_running() {
                self.start_running(hw);
            }
            return;
        }

        self.sink.set_state(SessionState::Configuring);

        let devices = hw.backend.devices();
        let Some(device) = pick_device(&devices, self.config.initial_facing) else {
            let error = CaptureError::HardwareConfigurationFailed("no camera devices found".into());
            log::error!("{}", error);
            self.sink.set_state(SessionState::Failed(error.clone()));
            self.sink.fail(error);
            return;
        };
        log::info!("Configuring {} ({:?})", device.name, device.facing);

        // Individual failures below are reported but don't stop the session
        // from coming up in a degraded state.
        let attach = hw
            .backend
            .open_input(&device)
            .and_then(|input| hw.backend.add_input(&input));
        if let Err(e) = attach {
            log::warn!("Failed to attach input for {}: {}", device.name, e);
            self.sink.fail(e);
        }

        if !hw.outputs_attached {
            match hw.backend.attach_outputs(self.sink.frame_callback()) {
                Ok(()) => hw.outputs_attached = true,
                Err(e) => {
                    log::warn!("Failed to attach outputs: {}", e);
                    self.sink.fail(e);
                }
            }
        }

        if device.supports_continuous_autofocus {
            let smooth = self.config.smooth_autofocus && device.supports_smooth_autofocus;
            if let Err(e) = hw.backend.set_focus_mode(FocusMode::ContinuousAutoFocus, smooth) {
                log::warn!("Failed to enable continuous autofocus: {}", e);
                self.sink.fail(e);
            }
        }

        hw.facing = device.facing;
        hw.device = Some(device);
        hw.configured = true;
        self.refresh_capabilities(hw, &devices);
        self.start_running(hw);
    }

    fn start_running(&self, hw: &mut Hardware<B>) {
        self.sink.classifier.lock().reset();
        match hw.backend.start_running() {
            Ok(()) => {
                self.sink.photos_open.store(true, Ordering::SeqCst);
                self.sink.set_state(SessionState::Running);
            }
            Err(e) => {
                log::error!("Failed to start camera session: {}", e);
                self.sink.set_state(SessionState::Failed(e.clone()));
                self.sink.fail(e);
            }
        }
    }

    fn switch_camera(&self, facing: CameraFacing) {
        let mut hw = self.hardware.lock();
        if !hw.configured {
            log::debug!("Ignoring camera switch before configuration");
            return;
        }
        if hw.facing == facing {
            return;
        }

        let previous = hw.backend.inputs();
        for input in &previous {
            hw.backend.remove_input(input.id);
        }

        let devices = hw.backend.devices();
        let attached = match devices.iter().find(|d| d.facing == facing) {
            Some(device) => hw
                .backend
                .open_input(device)
                .and_then(|input| hw.backend.add_input(&input))
                .map(|()| device.clone()),
            None => Err(CaptureError::HardwareConfigurationFailed(format!(
                "no {:?} camera available",
                facing
            ))),
        };

        match attached {
            Ok(device) => {
                log::info!("Switched to {} ({:?})", device.name, facing);
                hw.facing = facing;
                hw.device = Some(device);
                self.refresh_capabilities(&hw, &devices);
            }
            Err(e) => {
                log::warn!("Failed to switch to {:?} camera: {}", facing, e);
                for input in &previous {
                    if let Err(restore) = hw.backend.add_input(input) {
                        log::error!("Could not restore input {}, session has no input: {}", input.id, restore);
                    }
                }
                drop(hw);
                self.sink.fail(e);
            }
        }
    }

    fn capture(&self) {
        let mut hw = self.hardware.lock();
        if !hw.configured {
            drop(hw);
            self.sink.reject_capture("session is not configured");
            return;
        }
        if !hw.backend.is_running() || !self.sink.photos_open.load(Ordering::SeqCst) {
            drop(hw);
            self.sink.reject_capture("session is not running");
            return;
        }

        let orientation = *self.orientation.lock();
        let mut request = self.next_request(hw.template.as_ref(), hw.flash_mode, orientation);
        request.restrict_flash(&hw.backend.supported_flash_modes());
        hw.template = Some(request.clone());

        log::debug!(
            "Capturing photo {} (flash {:?}, {:?})",
            request.id,
            request.flash_mode,
            request.orientation
        );
        let sink = Arc::clone(&self.sink);
        hw.backend
            .capture_photo(&request, Box::new(move |result| sink.deliver_photo(result)));
    }

    fn next_request(
        &self,
        template: Option<&CaptureRequest>,
        flash_mode: FlashMode,
        orientation: VideoOrientation,
    ) -> CaptureRequest {
        match template {
            Some(previous) => previous.derive_from(flash_mode, orientation),
            None => CaptureRequest::new(self.config.photo_quality, flash_mode, orientation),
        }
    }

    fn refresh_capabilities(&self, hw: &Hardware<B>, devices: &[CameraDevice]) {
        let has_flash = hw.device.as_ref().is_some_and(CameraDevice::flash_usable);
        let supported = if has_flash {
            hw.backend.supported_flash_modes()
        } else {
            Vec::new()
        };

        let mut status = self.sink.status.lock();
        status.facing = hw.facing;
        status.has_flash = has_flash;
        status.supported_flash_modes = supported;
        status.has_front_camera = devices.iter().any(|d| d.facing == CameraFacing::Front);
    }
}

impl EventSink {
    /// Post a delegate call. The delegate is resolved when the task runs, so a
    /// delegate set after the command was issued still hears about it.
    fn emit<F>(&self, event: F)
    where
        F: FnOnce(&dyn CaptureDelegate) + Send + 'static,
    {
        let delegate = Arc::clone(&self.delegate);
        post_if_alive(&self.main, &self.alive, move || {
            let current = delegate.lock().as_ref().and_then(Weak::upgrade);
            if let Some(delegate) = current {
                event(delegate.as_ref());
            }
        });
    }

    fn complete<F>(&self, completion: F)
    where
        F: FnOnce() + Send + 'static,
    {
        post_if_alive(&self.main, &self.alive, completion);
    }

    fn fail(&self, error: CaptureError) {
        self.emit(move |d| d.on_capture_failed(&error));
    }

    fn set_state(&self, state: SessionState) {
        log::debug!("Session state -> {:?}", state);
        self.status.lock().state = state.clone();
        self.emit(move |d| d.on_state_changed(&state));
    }

    fn reject_capture(&self, reason: &str) {
        log::warn!("Capture rejected: {}", reason);
        self.diagnostics.lock().capture_failures += 1;
        self.fail(CaptureError::CaptureFailed(reason.into()));
    }

    fn deliver_photo(&self, result: Result<Vec<u8>, CaptureError>) {
        if !self.photos_open.load(Ordering::SeqCst) {
            self.diagnostics.lock().orphaned_completions += 1;
            log::warn!("Dropping photo completion that arrived after stop");
            return;
        }

        match result {
            Ok(data) => {
                self.diagnostics.lock().images_delivered += 1;
                self.emit(move |d| d.on_image_captured(&data));
            }
            Err(e) => {
                log::warn!("Photo capture failed: {}", e);
                self.diagnostics.lock().capture_failures += 1;
                self.fail(e);
            }
        }
    }

    /// Preview frame handler: throttle, classify, report.
    fn frame_callback(self: &Arc<Self>) -> FrameCallback {
        let sink = Arc::clone(self);
        Arc::new(move |frame: &VideoFrame| {
            sink.diagnostics.lock().frames_received += 1;
            let Some(condition) = sink.classifier.lock().sample(frame) else {
                return;
            };
            sink.diagnostics.lock().lighting_samples += 1;
            sink.emit(move |d| d.on_lighting_changed(condition));
        })
    }
}

/// The camera facing `facing`, else the backend's default (first) device.
fn pick_device(devices: &[CameraDevice], facing: CameraFacing) -> Option<CameraDevice> {
    devices
        .iter()
        .find(|d| d.facing == facing)
        .or_else(|| devices.first())
        .cloned()
}

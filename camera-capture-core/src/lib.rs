//! # camera-capture-core
//!
//! Platform-agnostic multi-photo capture pipeline.
//!
//! Drives a camera session from a dedicated worker queue, classifies ambient
//! lighting from throttled preview frames, and persists captured stills through
//! an asynchronous disk-backed asset store. Camera backends implement the
//! `CameraBackend` trait and plug into the generic `CaptureSessionController`.
//! Every event and completion is posted to a `MainContext` (the UI thread).
//!
//! ## Architecture
//!
//! ```text
//! camera-capture-core (this crate)
//! ├── dispatch/     ← SerialQueue (worker queues), MainContext / MainQueue (UI thread)
//! ├── traits/       ← CameraBackend, CaptureDelegate
//! ├── models/       ← CaptureError, SessionState, CaptureRequest, VideoFrame, StoredAsset, etc.
//! ├── processing/   ← LightingClassifier, JPEG orientation normalization
//! ├── session/      ← CaptureSessionController (generic over the backend)
//! └── storage/      ← AssetStore, timestamp naming
//! ```

pub mod dispatch;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use dispatch::main_queue::{MainContext, MainQueue};
pub use dispatch::serial_queue::SerialQueue;
pub use dispatch::Task;
pub use models::asset::StoredAsset;
pub use models::camera::{
    AuthorizationStatus, CameraDevice, CameraFacing, DeviceInput, DeviceOrientation, FlashMode, FocusMode,
    FocusPoint, PrepareOutcome, VideoOrientation,
};
pub use models::config::{SessionConfiguration, StoreConfiguration};
pub use models::diagnostics::SessionDiagnostics;
pub use models::error::CaptureError;
pub use models::frame::{PixelFormat, VideoFrame};
pub use models::lighting::LightingCondition;
pub use models::request::{CaptureRequest, PhotoCodec};
pub use models::state::{SessionState, SessionStatus};
pub use processing::lighting::{LightingClassifier, LightingThresholds};
pub use processing::photo::normalize_to_jpeg;
pub use session::controller::CaptureSessionController;
pub use storage::asset_store::AssetStore;
pub use traits::camera_backend::{CameraBackend, FrameCallback, PhotoCompletion};
pub use traits::capture_delegate::CaptureDelegate;

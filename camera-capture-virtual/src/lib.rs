//! # camera-capture-virtual
//!
//! Synthetic camera backend for camera-capture-core.
//!
//! Provides:
//! - `VirtualCamera`: `CameraBackend` that films a synthetic scene
//! - `DeviceCatalog`: back/front devices with flash and focus capabilities
//! - `ScriptedPermissions`: camera permission with a pre-recorded prompt answer
//! - `Scene`: daylight, dim and backlit presets for the lighting classifier
//! - `CameraProbe`: inspect the hardware session and change the scene from outside
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use camera_capture_core::{CaptureSessionController, MainQueue, SessionConfiguration};
//! use camera_capture_virtual::VirtualCamera;
//!
//! let main = Arc::new(MainQueue::new());
//! let camera = VirtualCamera::builtin();
//! let controller = CaptureSessionController::new(camera, SessionConfiguration::default(), main.clone())?;
//! controller.prepare(|outcome| println!("camera ready: {:?}", outcome));
//! ```

pub mod device_catalog;
pub mod permissions;
pub mod scene;
pub mod virtual_camera;

pub use device_catalog::DeviceCatalog;
pub use permissions::ScriptedPermissions;
pub use scene::Scene;
pub use virtual_camera::{CameraProbe, VirtualCamera, VirtualCameraOptions};

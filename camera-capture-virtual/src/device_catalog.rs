//! Camera devices exposed by the virtual hardware.
//!
//! Mirrors a typical phone: a back camera with a flash unit and point-of-interest
//! focus, and a front camera without flash.

use camera_capture_core::{CameraDevice, CameraFacing, FlashMode};

/// The devices a [`VirtualCamera`](crate::VirtualCamera) reports, default device first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCatalog {
    devices: Vec<CameraDevice>,
    flash_modes: Vec<FlashMode>,
}

impl DeviceCatalog {
    /// Back camera (default) and front camera.
    pub fn builtin() -> Self {
        Self {
            devices: vec![back_camera(), front_camera()],
            flash_modes: FlashMode::CYCLE.to_vec(),
        }
    }

    /// A device with only a rear camera.
    pub fn back_only() -> Self {
        Self {
            devices: vec![back_camera()],
            flash_modes: FlashMode::CYCLE.to_vec(),
        }
    }

    /// A device with only a front camera, e.g. a laptop.
    pub fn front_only() -> Self {
        Self {
            devices: vec![front_camera()],
            flash_modes: Vec::new(),
        }
    }

    /// No cameras at all.
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            flash_modes: Vec::new(),
        }
    }

    /// Restrict the photo output to `modes` on devices with a flash.
    pub fn with_flash_modes(mut self, modes: &[FlashMode]) -> Self {
        self.flash_modes = modes.to_vec();
        self
    }

    /// Mark the flash unit as temporarily unavailable (e.g. overheated).
    pub fn with_flash_unavailable(mut self) -> Self {
        for device in &mut self.devices {
            device.flash_available = false;
        }
        self
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn find(&self, id: &str) -> Option<&CameraDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Flash modes the photo output accepts while `device` is attached.
    pub fn flash_modes_for(&self, device: &CameraDevice) -> Vec<FlashMode> {
        if device.flash_usable() {
            self.flash_modes.clone()
        } else {
            Vec::new()
        }
    }
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn back_camera() -> CameraDevice {
    CameraDevice {
        id: "virtual:back-wide".into(),
        name: "Back Wide Camera".into(),
        facing: CameraFacing::Back,
        has_flash: true,
        flash_available: true,
        supports_continuous_autofocus: true,
        supports_smooth_autofocus: true,
        supports_focus_point: true,
    }
}

fn front_camera() -> CameraDevice {
    CameraDevice {
        id: "virtual:front".into(),
        name: "Front Camera".into(),
        facing: CameraFacing::Front,
        has_flash: false,
        flash_available: false,
        supports_continuous_autofocus: true,
        supports_smooth_autofocus: false,
        supports_focus_point: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lists_back_camera_first() {
        let catalog = DeviceCatalog::builtin();
        let facings: Vec<CameraFacing> = catalog.devices().iter().map(|d| d.facing).collect();
        assert_eq!(facings, vec![CameraFacing::Back, CameraFacing::Front]);
    }

    #[test]
    fn flash_modes_follow_the_device() {
        let catalog = DeviceCatalog::builtin().with_flash_modes(&[FlashMode::Off, FlashMode::On]);
        let back = catalog.find("virtual:back-wide").unwrap();
        let front = catalog.find("virtual:front").unwrap();

        assert_eq!(catalog.flash_modes_for(back), vec![FlashMode::Off, FlashMode::On]);
        assert!(catalog.flash_modes_for(front).is_empty());
    }

    #[test]
    fn unavailable_flash_reports_no_modes() {
        let catalog = DeviceCatalog::back_only().with_flash_unavailable();
        let back = &catalog.devices()[0];
        assert!(back.has_flash);
        assert!(catalog.flash_modes_for(back).is_empty());
    }
}

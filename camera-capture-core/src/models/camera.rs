use serde::{Deserialize, Serialize};

/// Which side of the device a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

impl CameraFacing {
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

/// Still-image flash mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Off,
    #[default]
    Auto,
    On,
}

impl FlashMode {
    /// Order in which the flash button cycles.
    pub const CYCLE: [FlashMode; 3] = [FlashMode::Off, FlashMode::Auto, FlashMode::On];

    /// The mode after `self` within the supported subset of [`FlashMode::CYCLE`].
    ///
    /// Wraps to the first supported mode after the last one. A current mode that
    /// is not supported restarts the cycle. `None` when nothing is supported.
    pub fn next_supported(self, supported: &[FlashMode]) -> Option<FlashMode> {
        let cycle: Vec<FlashMode> = Self::CYCLE
            .iter()
            .copied()
            .filter(|mode| supported.contains(mode))
            .collect();
        if cycle.is_empty() {
            return None;
        }
        let next = match cycle.iter().position(|mode| *mode == self) {
            Some(index) => (index + 1) % cycle.len(),
            None => 0,
        };
        Some(cycle[next])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusMode {
    Locked,
    AutoFocus,
    ContinuousAutoFocus,
}

/// A focus point of interest in normalized device coordinates, (0,0) top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

impl FocusPoint {
    /// Clamps both coordinates into `0.0..=1.0`.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Physical orientation reported by the device's rotation notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOrientation {
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

/// Orientation applied to the capture connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeRight,
    LandscapeLeft,
}

impl VideoOrientation {
    /// Map a device orientation onto the capture connection.
    ///
    /// The landscape cases cross over: a device rotated to landscape-left has its
    /// sensor in landscape-right. Flat and unknown orientations carry no
    /// information and yield `None`.
    pub fn from_device(orientation: DeviceOrientation) -> Option<Self> {
        match orientation {
            DeviceOrientation::Portrait => Some(Self::Portrait),
            DeviceOrientation::PortraitUpsideDown => Some(Self::PortraitUpsideDown),
            DeviceOrientation::LandscapeLeft => Some(Self::LandscapeRight),
            DeviceOrientation::LandscapeRight => Some(Self::LandscapeLeft),
            DeviceOrientation::FaceUp | DeviceOrientation::FaceDown | DeviceOrientation::Unknown => None,
        }
    }
}

/// A camera device as reported by the backend's discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub name: String,
    pub facing: CameraFacing,
    pub has_flash: bool,
    pub flash_available: bool,
    pub supports_continuous_autofocus: bool,
    pub supports_smooth_autofocus: bool,
    pub supports_focus_point: bool,
}

impl CameraDevice {
    /// Flash is usable only when the unit exists and is not temporarily unavailable
    /// (e.g. thermal shutdown).
    pub fn flash_usable(&self) -> bool {
        self.has_flash && self.flash_available
    }
}

/// A device input attached (or attachable) to the hardware session.
///
/// `id` is unique per opened input; re-opening the same device yields a new id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    pub id: u64,
    pub device_id: String,
    pub facing: CameraFacing,
}

/// Camera permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

/// Result of [`prepare`](crate::CaptureSessionController::prepare).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrepareOutcome {
    Authorized,
    Denied,
    Restricted,
    PendingThenAuthorized,
    PendingThenDenied,
}

impl PrepareOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized | Self::PendingThenAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_cycle_wraps_through_all_modes() {
        let all = FlashMode::CYCLE;
        assert_eq!(FlashMode::Off.next_supported(&all), Some(FlashMode::Auto));
        assert_eq!(FlashMode::Auto.next_supported(&all), Some(FlashMode::On));
        assert_eq!(FlashMode::On.next_supported(&all), Some(FlashMode::Off));
    }

    #[test]
    fn flash_cycle_skips_unsupported_modes() {
        let supported = [FlashMode::On, FlashMode::Off];
        assert_eq!(FlashMode::Off.next_supported(&supported), Some(FlashMode::On));
        assert_eq!(FlashMode::On.next_supported(&supported), Some(FlashMode::Off));
        // Auto is not supported here, so the cycle restarts at the first supported mode.
        assert_eq!(FlashMode::Auto.next_supported(&supported), Some(FlashMode::Off));
    }

    #[test]
    fn flash_cycle_with_single_mode_stays_put() {
        assert_eq!(FlashMode::Off.next_supported(&[FlashMode::Off]), Some(FlashMode::Off));
        assert_eq!(FlashMode::On.next_supported(&[]), None);
    }

    #[test]
    fn device_orientation_mapping() {
        assert_eq!(
            VideoOrientation::from_device(DeviceOrientation::LandscapeLeft),
            Some(VideoOrientation::LandscapeRight)
        );
        assert_eq!(
            VideoOrientation::from_device(DeviceOrientation::PortraitUpsideDown),
            Some(VideoOrientation::PortraitUpsideDown)
        );
        assert_eq!(VideoOrientation::from_device(DeviceOrientation::FaceUp), None);
        assert_eq!(VideoOrientation::from_device(DeviceOrientation::Unknown), None);
    }

    #[test]
    fn focus_point_is_clamped() {
        let point = FocusPoint::new(-0.5, 1.7);
        assert_eq!(point, FocusPoint { x: 0.0, y: 1.0 });
    }
}

use std::path::PathBuf;
use std::time::Duration;

use super::camera::CameraFacing;

/// Configuration for a [`CaptureSessionController`](crate::CaptureSessionController).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfiguration {
    /// Camera selected when the session is first configured (default: back).
    pub initial_facing: CameraFacing,

    /// Minimum spacing between lighting classifications (default: 1 s).
    pub sample_interval: Duration,

    /// Quality requested from the hardware JPEG encoder, `0.0..=1.0` (default: 0.9).
    pub photo_quality: f32,

    /// Enable smooth autofocus when the device supports it (default: true).
    pub smooth_autofocus: bool,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_interval.is_zero() {
            return Err("sample interval must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.photo_quality) {
            return Err(format!("photo quality out of range: {}", self.photo_quality));
        }
        Ok(())
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            initial_facing: CameraFacing::Back,
            sample_interval: Duration::from_secs(1),
            photo_quality: 0.9,
            smooth_autofocus: true,
        }
    }
}

/// Configuration for an [`AssetStore`](crate::AssetStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfiguration {
    /// Platform caches area the session directory is created under.
    pub caches_root: PathBuf,

    /// Fixed directory between `caches_root` and the per-session directory.
    pub directory_prefix: String,

    /// JPEG quality for re-encoded assets, 1–100 (default: 100).
    pub jpeg_quality: u8,
}

impl StoreConfiguration {
    pub fn with_caches_root(caches_root: impl Into<PathBuf>) -> Self {
        Self {
            caches_root: caches_root.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.directory_prefix.is_empty() {
            return Err("directory prefix must not be empty".into());
        }
        if self.directory_prefix.contains(['/', '\\']) {
            return Err(format!("directory prefix must be a single component: {}", self.directory_prefix));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!("unsupported jpeg quality: {}", self.jpeg_quality));
        }
        Ok(())
    }
}

impl Default for StoreConfiguration {
    fn default() -> Self {
        Self {
            caches_root: std::env::temp_dir(),
            directory_prefix: "multi-capture.disk-cache".into(),
            jpeg_quality: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SessionConfiguration::default().validate().is_ok());
        assert!(StoreConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_interval() {
        let config = SessionConfiguration {
            sample_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nested_prefix_and_bad_quality() {
        let nested = StoreConfiguration {
            directory_prefix: "a/b".into(),
            ..Default::default()
        };
        assert!(nested.validate().is_err());

        let zero_quality = StoreConfiguration {
            jpeg_quality: 0,
            ..Default::default()
        };
        assert!(zero_quality.validate().is_err());
    }
}

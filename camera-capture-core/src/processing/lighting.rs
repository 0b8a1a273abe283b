use std::time::Duration;

use crate::models::frame::{PixelFormat, VideoFrame};
use crate::models::lighting::LightingCondition;

/// Luma thresholds (Rec.601, `0.0..=1.0`) used by [`LightingClassifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingThresholds {
    /// Mean luma below this is low light.
    pub low_light: f32,
    /// Minimum surround luma for a backlit scene.
    pub backlight_surround: f32,
    /// How much darker the centre must be than the surround.
    pub backlight_delta: f32,
}

impl Default for LightingThresholds {
    fn default() -> Self {
        Self {
            low_light: 0.2,
            backlight_surround: 0.6,
            backlight_delta: 0.25,
        }
    }
}

/// Throttled ambient lighting estimator for the preview stream.
///
/// Keeps one piece of state: the presentation timestamp of the last accepted
/// frame. A frame is accepted only when at least `interval` has passed since
/// then, so classification cost is bounded by the interval, not the sensor rate.
/// Rejected frames are dropped, never buffered.
#[derive(Debug, Clone)]
pub struct LightingClassifier {
    interval: Duration,
    thresholds: LightingThresholds,
    last_sample: Option<Duration>,
}

/// Roughly this many samples per axis, whatever the frame size.
const GRID_STEPS: u32 = 32;

impl LightingClassifier {
    pub fn new(interval: Duration) -> Self {
        Self::with_thresholds(interval, LightingThresholds::default())
    }

    pub fn with_thresholds(interval: Duration, thresholds: LightingThresholds) -> Self {
        Self {
            interval,
            thresholds,
            last_sample: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Throttle, then classify.
    ///
    /// A malformed frame still takes the slot; the next attempt waits a full
    /// interval like after any other sample.
    pub fn sample(&mut self, frame: &VideoFrame) -> Option<LightingCondition> {
        if !self.accept(frame.timestamp) {
            return None;
        }
        self.classify(frame)
    }

    /// Claim the sampling slot for `timestamp` if the interval has elapsed.
    ///
    /// A timestamp earlier than the last sample means the clock restarted
    /// (session restart) and is always accepted.
    pub fn accept(&mut self, timestamp: Duration) -> bool {
        if let Some(last) = self.last_sample {
            if timestamp >= last && timestamp - last < self.interval {
                return false;
            }
        }
        self.last_sample = Some(timestamp);
        true
    }

    /// Forget the last sample so the next frame is accepted.
    pub fn reset(&mut self) {
        self.last_sample = None;
    }

    /// Classify one frame without throttling.
    pub fn classify(&self, frame: &VideoFrame) -> Option<LightingCondition> {
        if frame.format != PixelFormat::Bgra8 || !frame.is_well_formed() {
            return None;
        }

        let step_x = (frame.width / GRID_STEPS).max(1);
        let step_y = (frame.height / GRID_STEPS).max(1);
        let (cx0, cx1) = (frame.width / 3, frame.width * 2 / 3);
        let (cy0, cy1) = (frame.height / 3, frame.height * 2 / 3);

        let mut center = (0.0f32, 0u32);
        let mut surround = (0.0f32, 0u32);

        for y in (0..frame.height).step_by(step_y as usize) {
            for x in (0..frame.width).step_by(step_x as usize) {
                let luma = frame.luma_at(x, y)?;
                let in_center = (cx0..cx1).contains(&x) && (cy0..cy1).contains(&y);
                let bucket = if in_center { &mut center } else { &mut surround };
                bucket.0 += luma;
                bucket.1 += 1;
            }
        }

        let total = center.1 + surround.1;
        if total == 0 {
            return None;
        }
        let mean = (center.0 + surround.0) / total as f32;
        if mean < self.thresholds.low_light {
            return Some(LightingCondition::LowLight);
        }

        if center.1 > 0 && surround.1 > 0 {
            let center_mean = center.0 / center.1 as f32;
            let surround_mean = surround.0 / surround.1 as f32;
            if surround_mean >= self.thresholds.backlight_surround
                && surround_mean - center_mean >= self.thresholds.backlight_delta
            {
                return Some(LightingCondition::Backlit);
            }
        }

        Some(LightingCondition::Normal)
    }
}

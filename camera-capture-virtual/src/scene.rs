//! Synthetic scenes rendered into preview frames and stills.
//!
//! A scene is a flat background with a rectangular subject filling the middle
//! third of the picture, which is enough to drive every lighting condition.

use image::{Rgb, RgbImage};

/// Colours of a synthetic scene, RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub background: [u8; 3],
    pub subject: [u8; 3],
}

impl Scene {
    /// Evenly lit room: subject and background of similar brightness.
    pub fn daylight() -> Self {
        Self {
            background: [150, 160, 140],
            subject: [130, 140, 120],
        }
    }

    /// Dark room.
    pub fn dim() -> Self {
        Self {
            background: [30, 30, 36],
            subject: [22, 20, 26],
        }
    }

    /// Subject in front of a bright window.
    pub fn backlit() -> Self {
        Self {
            background: [240, 240, 235],
            subject: [60, 50, 45],
        }
    }

    /// The scene lit by the flash unit.
    pub fn with_flash(self) -> Self {
        let lift = |c: [u8; 3]| c.map(|v| v.saturating_add(90));
        Self {
            background: lift(self.background),
            subject: lift(self.subject),
        }
    }

    /// Rec.601 luma of the background in `0.0..=1.0`.
    pub fn ambient_luma(&self) -> f32 {
        let [r, g, b] = self.background.map(f32::from);
        (0.299 * r + 0.587 * g + 0.114 * b) / 255.0
    }

    /// Tightly packed BGRA pixels.
    pub fn render_bgra(&self, width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = self.color_at(x, y, width, height);
                data.extend_from_slice(&[b, g, r, 255]);
            }
        }
        data
    }

    /// Render a still photo. `mirrored` flips it horizontally, like a front camera.
    pub fn render_still(&self, width: u32, height: u32, mirrored: bool) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let sx = if mirrored { width - 1 - x } else { x };
            Rgb(self.color_at(sx, y, width, height))
        })
    }

    fn color_at(&self, x: u32, y: u32, width: u32, height: u32) -> [u8; 3] {
        let in_subject = (width / 3..width * 2 / 3).contains(&x) && (height / 3..height * 2 / 3).contains(&y);
        if in_subject {
            self.subject
        } else {
            self.background
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::daylight()
    }
}

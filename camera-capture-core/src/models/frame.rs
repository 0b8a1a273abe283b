use std::time::Duration;

/// Pixel layout of a preview frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    #[default]
    Bgra8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8 => 4,
        }
    }
}

/// One raw frame from the hardware's video output.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub format: PixelFormat,
    /// Presentation timestamp, monotonic within one running session.
    pub timestamp: Duration,
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// A tightly packed BGRA frame.
    pub fn bgra(width: u32, height: u32, timestamp: Duration, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes_per_row: width as usize * PixelFormat::Bgra8.bytes_per_pixel(),
            format: PixelFormat::Bgra8,
            timestamp,
            data,
        }
    }

    /// Whether the buffer is large enough for the declared geometry.
    pub fn is_well_formed(&self) -> bool {
        let row = self.width as usize * self.format.bytes_per_pixel();
        self.width > 0
            && self.height > 0
            && self.bytes_per_row >= row
            && self.data.len() >= self.bytes_per_row * (self.height as usize - 1) + row
    }

    /// Rec.601 luma of the pixel at `(x, y)` in `0.0..=1.0`.
    pub fn luma_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.bytes_per_row + x as usize * self.format.bytes_per_pixel();
        let px = self.data.get(offset..offset + 4)?;
        let (b, g, r) = (px[0] as f32, px[1] as f32, px[2] as f32);
        Some((0.299 * r + 0.587 * g + 0.114 * b) / 255.0)
    }
}

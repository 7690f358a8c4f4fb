//! Grayscale frames and the floating-point planes the tracker works on

/// An 8-bit grayscale frame, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GrayFrame {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty);
        }
        if pixels.len() != width * height {
            return Err(FrameError::SizeMismatch {
                expected: width * height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn same_size(&self, other: &GrayFrame) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Mirror left-to-right, so motion toward the camera's left reads as +x
    pub fn flip_horizontal(&self) -> GrayFrame {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for row in self.pixels.chunks_exact(self.width) {
            pixels.extend(row.iter().rev());
        }
        GrayFrame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Frame construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame has zero width or height")]
    Empty,

    #[error("expected {expected} pixels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Intensity plane in `[0, 1]` with border-replicating access
#[derive(Debug, Clone)]
pub(crate) struct Plane {
    pub width: usize,
    pub height: usize,
    data: Vec<f32>,
}

impl Plane {
    pub fn from_frame(frame: &GrayFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            data: frame.pixels.iter().map(|&p| p as f32 / 255.0).collect(),
        }
    }

    #[inline]
    pub fn at(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.data[y * self.width + x]
    }

    /// Bilinear sample; coordinates outside the plane read the nearest edge
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (xi, yi) = (x0 as isize, y0 as isize);

        let top = self.at(xi, yi) * (1.0 - fx) + self.at(xi + 1, yi) * fx;
        let bottom = self.at(xi, yi + 1) * (1.0 - fx) + self.at(xi + 1, yi + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// Half-resolution plane after a 5-tap binomial blur
    pub fn downsample(&self) -> Plane {
        const KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

        let width = (self.width + 1) / 2;
        let height = (self.height + 1) / 2;

        // horizontal pass, decimated columns
        let mut rows = vec![0.0f32; width * self.height];
        for y in 0..self.height {
            for x in 0..width {
                let cx = (x * 2) as isize;
                rows[y * width + x] = KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * self.at(cx + k as isize - 2, y as isize))
                    .sum();
            }
        }

        // vertical pass, decimated rows
        let row_at = |x: usize, y: isize| rows[y.clamp(0, self.height as isize - 1) as usize * width + x];
        let mut data = vec![0.0f32; width * height];
        for y in 0..height {
            let cy = (y * 2) as isize;
            for x in 0..width {
                data[y * width + x] = KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * row_at(x, cy + k as isize - 2))
                    .sum();
            }
        }

        Plane {
            width,
            height,
            data,
        }
    }

    /// Central-difference derivative along x
    pub fn gradient_x(&self) -> Plane {
        self.map_neighbourhood(|p, x, y| (p.at(x + 1, y) - p.at(x - 1, y)) * 0.5)
    }

    /// Central-difference derivative along y
    pub fn gradient_y(&self) -> Plane {
        self.map_neighbourhood(|p, x, y| (p.at(x, y + 1) - p.at(x, y - 1)) * 0.5)
    }

    pub fn map_neighbourhood(&self, f: impl Fn(&Plane, isize, isize) -> f32) -> Plane {
        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..self.height as isize {
            for x in 0..self.width as isize {
                data.push(f(self, x, y));
            }
        }
        Plane {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_dimensions() {
        assert_eq!(GrayFrame::new(0, 4, vec![]), Err(FrameError::Empty));
        assert_eq!(
            GrayFrame::new(2, 2, vec![0; 3]),
            Err(FrameError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert!(GrayFrame::new(2, 2, vec![0; 4]).is_ok());
    }

    #[test]
    fn flip_horizontal_mirrors_rows() {
        let frame = GrayFrame::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let flipped = frame.flip_horizontal();
        assert_eq!(flipped.pixels(), &[3, 2, 1, 6, 5, 4]);
        assert_eq!(flipped.flip_horizontal(), frame);
    }

    #[test]
    fn bilinear_sample_interpolates_and_clamps() {
        let frame = GrayFrame::new(2, 1, vec![0, 255]).unwrap();
        let plane = Plane::from_frame(&frame);
        assert!((plane.sample(0.5, 0.0) - 0.5).abs() < 1e-6);
        assert_eq!(plane.sample(-3.0, 0.0), 0.0);
        assert_eq!(plane.sample(7.0, 4.0), 1.0);
    }

    #[test]
    fn downsample_halves_and_preserves_flat_intensity() {
        let frame = GrayFrame::from_fn(9, 6, |_, _| 102);
        let half = Plane::from_frame(&frame).downsample();
        assert_eq!((half.width, half.height), (5, 3));
        for y in 0..3 {
            for x in 0..5 {
                assert!((half.at(x, y) - 0.4).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn gradients_follow_a_ramp() {
        let frame = GrayFrame::from_fn(8, 8, |x, _| (x * 10) as u8);
        let plane = Plane::from_frame(&frame);
        let gx = plane.gradient_x();
        let gy = plane.gradient_y();
        assert!((gx.at(4, 4) - 10.0 / 255.0).abs() < 1e-6);
        assert_eq!(gy.at(4, 4), 0.0);
    }
}

//! Shi-Tomasi corner detection
//!
//! Scores each pixel by the smaller eigenvalue of its local structure tensor,
//! keeps strong local maxima, then picks the best ones at a minimum spacing.

use std::cmp::Ordering;

use glam::Vec2;

use super::frame::{GrayFrame, Plane};

/// Corner detector parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureParams {
    /// Upper bound on returned corners
    pub max_corners: usize,
    /// Minimum response relative to the strongest corner
    pub quality_level: f32,
    /// Minimum Euclidean spacing between returned corners
    pub min_distance: f32,
    /// Side of the structure tensor window
    pub block_size: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.01,
            min_distance: 7.0,
            block_size: 7,
        }
    }
}

/// Detect trackable corners, strongest first
pub fn good_features_to_track(frame: &GrayFrame, params: &FeatureParams) -> Vec<Vec2> {
    if params.max_corners == 0 {
        return Vec::new();
    }

    let plane = Plane::from_frame(frame);
    let response = min_eigen_response(&plane, params.block_size.max(1));

    let max_response = response.iter().copied().fold(0.0f32, f32::max);
    if max_response <= 0.0 {
        return Vec::new();
    }
    let threshold = max_response * params.quality_level;

    let (width, height) = (plane.width, plane.height);
    let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let r = response[y * width + x];
            if r > 0.0 && r >= threshold && is_local_max(&response, width, height, x, y) {
                candidates.push((r, x, y));
            }
        }
    }

    // Strongest first; ties resolved in scan order so results are reproducible.
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.2, a.1).cmp(&(b.2, b.1)))
    });

    let min_dist_sq = params.min_distance * params.min_distance;
    let mut corners: Vec<Vec2> = Vec::with_capacity(params.max_corners.min(candidates.len()));
    for (_, x, y) in candidates {
        let point = Vec2::new(x as f32, y as f32);
        if corners.iter().all(|c| c.distance_squared(point) >= min_dist_sq) {
            corners.push(point);
            if corners.len() == params.max_corners {
                break;
            }
        }
    }

    corners
}

/// Per-pixel minimum eigenvalue of the block-summed Sobel structure tensor
///
/// Pixels whose block (or Sobel support) would leave the frame score zero.
fn min_eigen_response(plane: &Plane, block_size: usize) -> Vec<f32> {
    let (width, height) = (plane.width, plane.height);
    let len = width * height;

    let mut ixx = Vec::with_capacity(len);
    let mut ixy = Vec::with_capacity(len);
    let mut iyy = Vec::with_capacity(len);
    for y in 0..height as isize {
        for x in 0..width as isize {
            let gx = (plane.at(x + 1, y - 1) + 2.0 * plane.at(x + 1, y) + plane.at(x + 1, y + 1))
                - (plane.at(x - 1, y - 1) + 2.0 * plane.at(x - 1, y) + plane.at(x - 1, y + 1));
            let gy = (plane.at(x - 1, y + 1) + 2.0 * plane.at(x, y + 1) + plane.at(x + 1, y + 1))
                - (plane.at(x - 1, y - 1) + 2.0 * plane.at(x, y - 1) + plane.at(x + 1, y - 1));
            ixx.push(gx * gx);
            ixy.push(gx * gy);
            iyy.push(gy * gy);
        }
    }

    let sxx = SummedArea::new(width, height, &ixx);
    let sxy = SummedArea::new(width, height, &ixy);
    let syy = SummedArea::new(width, height, &iyy);

    let radius = block_size / 2;
    let margin = radius + 1;
    let mut response = vec![0.0f32; len];
    if width <= 2 * margin || height <= 2 * margin {
        return response;
    }

    for y in margin..height - margin {
        for x in margin..width - margin {
            let (x0, y0, x1, y1) = (x - radius, y - radius, x + radius, y + radius);
            let a = sxx.sum(x0, y0, x1, y1);
            let b = sxy.sum(x0, y0, x1, y1);
            let c = syy.sum(x0, y0, x1, y1);

            let half_trace = (a + c) * 0.5;
            let spread = ((a - c) * 0.5).powi(2) + b * b;
            let min_eig = half_trace - spread.sqrt();
            response[y * width + x] = min_eig.max(0.0) as f32;
        }
    }

    response
}

fn is_local_max(response: &[f32], width: usize, height: usize, x: usize, y: usize) -> bool {
    let value = response[y * width + x];
    let (x0, x1) = (x.saturating_sub(1), (x + 1).min(width - 1));
    let (y0, y1) = (y.saturating_sub(1), (y + 1).min(height - 1));
    for ny in y0..=y1 {
        for nx in x0..=x1 {
            if response[ny * width + nx] > value {
                return false;
            }
        }
    }
    true
}

/// Summed-area table for O(1) box sums
struct SummedArea {
    stride: usize,
    data: Vec<f64>,
}

impl SummedArea {
    fn new(width: usize, height: usize, values: &[f32]) -> Self {
        let stride = width + 1;
        let mut data = vec![0.0f64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0.0f64;
            for x in 0..width {
                row_sum += values[y * width + x] as f64;
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, data }
    }

    /// Sum over the inclusive rectangle `[x0, x1] x [y0, y1]`
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let s = self.stride;
        self.data[(y1 + 1) * s + x1 + 1] - self.data[y0 * s + x1 + 1] - self.data[(y1 + 1) * s + x0]
            + self.data[y0 * s + x0]
    }
}

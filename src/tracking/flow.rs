//! Pyramidal Lucas-Kanade point tracking

use glam::Vec2;

use super::frame::{GrayFrame, Plane};

/// Smallest normalized eigenvalue of the window's gradient matrix that still
/// counts as trackable
///
/// Expressed for intensities in `[0, 1]`: the usual `1e-4` is defined on 8-bit
/// Scharr gradients scaled by `1/1024`, which is `1024 / 255²` times larger.
const MIN_EIGEN_THRESHOLD: f32 = 1e-4 * 1024.0 / (255.0 * 255.0);

/// Coarsest level is never built smaller than this on either side
const MIN_LEVEL_SIZE: usize = 8;

/// Optical flow parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    /// Side of the square integration window, in pixels
    pub window: usize,
    /// Highest pyramid level (0 = no pyramid)
    pub max_level: usize,
    /// Iteration cap per level
    pub max_iterations: u32,
    /// Stop iterating once an update moves less than this many pixels
    pub epsilon: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            window: 50,
            max_level: 2,
            max_iterations: 10,
            epsilon: 0.03,
        }
    }
}

struct Level {
    image: Plane,
    grad_x: Plane,
    grad_y: Plane,
}

struct Pyramid {
    levels: Vec<Level>,
}

impl Pyramid {
    fn build(frame: &GrayFrame, max_level: usize) -> Self {
        let mut planes = vec![Plane::from_frame(frame)];
        while planes.len() <= max_level {
            let last = &planes[planes.len() - 1];
            if last.width < 2 * MIN_LEVEL_SIZE || last.height < 2 * MIN_LEVEL_SIZE {
                break;
            }
            let next = last.downsample();
            planes.push(next);
        }

        let levels = planes
            .into_iter()
            .map(|image| Level {
                grad_x: image.gradient_x(),
                grad_y: image.gradient_y(),
                image,
            })
            .collect();

        Self { levels }
    }
}

/// Track `points` from `previous` into `current`
///
/// Returns one entry per input point: the new position, or `None` when the
/// point could not be followed (flat neighbourhood or tracked off-frame).
pub fn track_points(
    previous: &GrayFrame,
    current: &GrayFrame,
    points: &[Vec2],
    params: &FlowParams,
) -> Vec<Option<Vec2>> {
    if points.is_empty() {
        return Vec::new();
    }

    let prev_pyramid = Pyramid::build(previous, params.max_level);
    let next_pyramid = Pyramid::build(current, params.max_level);
    let depth = prev_pyramid.levels.len().min(next_pyramid.levels.len());

    let (width, height) = (current.width() as f32, current.height() as f32);

    points
        .iter()
        .map(|&point| {
            let flow = track_one(&prev_pyramid, &next_pyramid, depth, point, params)?;
            let moved = point + flow;
            let inside = moved.x >= 0.0 && moved.y >= 0.0 && moved.x <= width - 1.0 && moved.y <= height - 1.0;
            inside.then_some(moved)
        })
        .collect()
}

fn track_one(
    prev: &Pyramid,
    next: &Pyramid,
    depth: usize,
    point: Vec2,
    params: &FlowParams,
) -> Option<Vec2> {
    let half = (params.window / 2).max(1) as i32;
    let offsets: Vec<Vec2> = (-half..half)
        .flat_map(|dy| (-half..half).map(move |dx| Vec2::new(dx as f32, dy as f32)))
        .collect();
    let area = offsets.len() as f32;

    let mut guess = Vec2::ZERO;
    for level in (0..depth).rev() {
        let scale = (1u32 << level) as f32;
        let center = point / scale;
        let prev_level = &prev.levels[level];
        let next_level = &next.levels[level];

        // Template intensities and gradients are fixed for the whole level.
        let mut template = Vec::with_capacity(offsets.len());
        let (mut gxx, mut gxy, mut gyy) = (0.0f32, 0.0f32, 0.0f32);
        for offset in &offsets {
            let q = center + *offset;
            let ix = prev_level.grad_x.sample(q.x, q.y);
            let iy = prev_level.grad_y.sample(q.x, q.y);
            gxx += ix * ix;
            gxy += ix * iy;
            gyy += iy * iy;
            template.push((prev_level.image.sample(q.x, q.y), ix, iy));
        }

        let det = gxx * gyy - gxy * gxy;
        let min_eig = ((gxx + gyy) - ((gxx - gyy).powi(2) + 4.0 * gxy * gxy).sqrt()) * 0.5 / area;
        if min_eig < MIN_EIGEN_THRESHOLD || det <= 0.0 {
            // A coarse level without texture only loses its refinement.
            if level == 0 {
                return None;
            }
            guess *= 2.0;
            continue;
        }

        let mut step = Vec2::ZERO;
        for _ in 0..params.max_iterations {
            let base = center + guess + step;
            let mut mismatch = Vec2::ZERO;
            for (offset, &(intensity, ix, iy)) in offsets.iter().zip(&template) {
                let q = base + *offset;
                let diff = intensity - next_level.image.sample(q.x, q.y);
                mismatch.x += diff * ix;
                mismatch.y += diff * iy;
            }

            let eta = Vec2::new(
                (gyy * mismatch.x - gxy * mismatch.y) / det,
                (gxx * mismatch.y - gxy * mismatch.x) / det,
            );
            step += eta;
            if !step.is_finite() {
                return None;
            }
            if eta.length() <= params.epsilon {
                break;
            }
        }

        guess = if level > 0 { (guess + step) * 2.0 } else { guess + step };
    }

    Some(guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smooth blobs, shifted by `(sx, sy)`
    fn blob_frame(sx: f32, sy: f32) -> GrayFrame {
        let blobs = [(60.0, 50.0), (120.0, 70.0), (90.0, 100.0)];
        GrayFrame::from_fn(180, 150, |x, y| {
            let mut v = 20.0;
            for (bx, by) in blobs {
                let dx = x as f32 - (bx + sx);
                let dy = y as f32 - (by + sy);
                v += 200.0 * (-(dx * dx + dy * dy) / (2.0 * 36.0)).exp();
            }
            v.min(255.0) as u8
        })
    }

    #[test]
    fn recovers_a_pure_translation() {
        let prev = blob_frame(0.0, 0.0);
        let next = blob_frame(4.0, -3.0);
        let points = [Vec2::new(60.0, 50.0), Vec2::new(120.0, 70.0), Vec2::new(90.0, 100.0)];

        let tracked = track_points(&prev, &next, &points, &FlowParams::default());
        assert_eq!(tracked.len(), points.len());
        for (old, new) in points.iter().zip(&tracked) {
            let new = new.expect("blob center should be trackable");
            let flow = new - *old;
            assert!((flow.x - 4.0).abs() < 0.5, "flow {flow:?}");
            assert!((flow.y + 3.0).abs() < 0.5, "flow {flow:?}");
        }
    }

    #[test]
    fn faint_texture_is_still_tracked() {
        // Roughly 30 grey levels of contrast over a mid-grey background.
        let frame = |sx: f32| {
            GrayFrame::from_fn(180, 150, |x, y| {
                let dx = x as f32 - (90.0 + sx);
                let dy = y as f32 - 75.0;
                (100.0 + 30.0 * (-(dx * dx + dy * dy) / (2.0 * 64.0)).exp()) as u8
            })
        };
        let point = Vec2::new(90.0, 75.0);

        let tracked = track_points(&frame(0.0), &frame(5.0), &[point], &FlowParams::default());
        let flow = tracked[0].expect("faint blob should be trackable") - point;
        assert!((flow.x - 5.0).abs() < 0.75, "flow {flow:?}");
        assert!(flow.y.abs() < 0.75, "flow {flow:?}");
    }

    #[test]
    fn threshold_matches_eight_bit_scale() {
        assert!((MIN_EIGEN_THRESHOLD - 1.575e-6).abs() < 1e-8);
    }

    #[test]
    fn flat_neighbourhood_is_not_found() {
        let frame = GrayFrame::from_fn(120, 120, |_, _| 90);
        let tracked = track_points(&frame, &frame, &[Vec2::new(60.0, 60.0)], &FlowParams::default());
        assert_eq!(tracked, vec![None]);
    }

    #[test]
    fn identical_frames_give_zero_flow() {
        let frame = blob_frame(0.0, 0.0);
        let point = Vec2::new(60.0, 50.0);
        let tracked = track_points(&frame, &frame, &[point], &FlowParams::default());
        let moved = tracked[0].unwrap();
        assert!(moved.distance(point) < 0.05);
    }

    #[test]
    fn pyramid_stops_before_levels_get_tiny() {
        let frame = GrayFrame::from_fn(20, 20, |x, _| x as u8);
        let pyramid = Pyramid::build(&frame, 5);
        assert_eq!(pyramid.levels.len(), 2);
        assert_eq!(pyramid.levels[1].image.width, 10);
    }
}

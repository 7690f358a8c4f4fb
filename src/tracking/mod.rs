//! Motion tracking: camera frames in, smoothed control vector out
//!
//! Each frame pair goes through corner detection, pyramidal Lucas-Kanade
//! flow, deviation thresholding and a short moving average. Point identity is
//! not kept between frames; corners are re-detected on every new frame.

pub mod features;
pub mod filter;
pub mod flow;
pub mod frame;

pub use features::{good_features_to_track, FeatureParams};
pub use filter::{intentional_mean, ControlVector, MotionFilter, HISTORY_LEN, MOTION_THRESHOLD, OUTPUT_SCALE};
pub use flow::{track_points, FlowParams};
pub use frame::{FrameError, GrayFrame};

use glam::Vec2;
use tracing::{debug, warn};

/// A pixel position followed between two consecutive frames
pub type TrackedPoint = Vec2;

/// Turns consecutive grayscale frames into control vectors
#[derive(Debug, Clone)]
pub struct MotionTracker {
    features: FeatureParams,
    flow: FlowParams,
    filter: MotionFilter,
    previous: Option<(GrayFrame, Vec<TrackedPoint>)>,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::with_params(FeatureParams::default(), FlowParams::default(), MotionFilter::default())
    }

    pub fn with_params(features: FeatureParams, flow: FlowParams, filter: MotionFilter) -> Self {
        Self {
            features,
            flow,
            filter,
            previous: None,
        }
    }

    /// Corner detection used both for bootstrap and re-detection
    pub fn detect(&self, frame: &GrayFrame) -> Vec<TrackedPoint> {
        good_features_to_track(frame, &self.features)
    }

    /// Advance the tracker by one frame pair
    ///
    /// Both frames must share dimensions. Returns the smoothed vector and the
    /// points detected on `current`, which feed the next call.
    pub fn track(
        &mut self,
        previous: &GrayFrame,
        current: &GrayFrame,
        previous_points: &[TrackedPoint],
    ) -> (ControlVector, Vec<TrackedPoint>) {
        debug_assert!(previous.same_size(current), "frame dimensions changed");

        let tracked = track_points(previous, current, previous_points, &self.flow);
        let displacements: Vec<Vec2> = previous_points
            .iter()
            .zip(&tracked)
            .filter_map(|(old, new)| new.map(|new| new - *old))
            .collect();

        let vector = self.filter.push(&displacements);
        debug!(
            points = previous_points.len(),
            tracked = displacements.len(),
            x = vector.x(),
            y = vector.y(),
            "Tracked frame"
        );

        (vector, self.detect(current))
    }

    /// Feed the next frame from a source, keeping the previous frame internally
    ///
    /// The first frame (or a frame whose size differs from the last one) only
    /// bootstraps the point set and yields the current smoothed value.
    pub fn process(&mut self, frame: GrayFrame) -> ControlVector {
        match self.previous.take() {
            Some((previous, points)) if previous.same_size(&frame) => {
                let (vector, next_points) = self.track(&previous, &frame, &points);
                self.previous = Some((frame, next_points));
                vector
            }
            Some((previous, _)) => {
                warn!(
                    from = ?(previous.width(), previous.height()),
                    to = ?(frame.width(), frame.height()),
                    "Frame size changed, re-detecting features"
                );
                self.bootstrap(frame)
            }
            None => self.bootstrap(frame),
        }
    }

    fn bootstrap(&mut self, frame: GrayFrame) -> ControlVector {
        let points = self.detect(&frame);
        debug!(points = points.len(), "Bootstrapped feature points");
        self.previous = Some((frame, points));
        self.filter.smoothed()
    }

    /// Points that the next frame will be tracked from
    pub fn points(&self) -> &[TrackedPoint] {
        match &self.previous {
            Some((_, points)) => points.as_slice(),
            None => &[],
        }
    }
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bright soft-edged rectangles on a dark background, offset by `(sx, sy)`
    fn scene(sx: f32, sy: f32) -> GrayFrame {
        scene_with(30.0, 180.0, sx, sy)
    }

    fn scene_with(background: f32, contrast: f32, sx: f32, sy: f32) -> GrayFrame {
        let rects = [
            (40.0, 40.0, 30.0, 22.0),
            (110.0, 60.0, 26.0, 34.0),
            (60.0, 100.0, 36.0, 20.0),
        ];
        let ramp = |v: f32| (v / 4.0).clamp(0.0, 1.0);
        GrayFrame::from_fn(200, 160, |x, y| {
            let (x, y) = (x as f32 - sx, y as f32 - sy);
            let coverage = rects
                .iter()
                .map(|&(l, t, w, h)| {
                    ramp(x - l + 2.0).min(ramp(l + w + 2.0 - x)) * ramp(y - t + 2.0).min(ramp(t + h + 2.0 - y))
                })
                .fold(0.0f32, f32::max);
            (background + contrast * coverage) as u8
        })
    }

    #[test]
    fn still_scene_produces_zero_vector() {
        let mut tracker = MotionTracker::new();
        let frame = scene(0.0, 0.0);
        let points = tracker.detect(&frame);
        assert!(!points.is_empty());

        let (vector, next_points) = tracker.track(&frame, &frame, &points);
        assert_eq!(vector, ControlVector::ZERO);
        assert!(!next_points.is_empty());
    }

    #[test]
    fn small_motion_is_filtered_out() {
        let mut tracker = MotionTracker::new();
        let prev = scene(0.0, 0.0);
        let next = scene(3.0, 2.0);
        let points = tracker.detect(&prev);

        let (vector, _) = tracker.track(&prev, &next, &points);
        assert_eq!(vector, ControlVector::ZERO);
    }

    #[test]
    fn large_motion_passes_and_is_averaged() {
        let mut tracker = MotionTracker::new();
        let prev = scene(0.0, 0.0);
        let next = scene(10.0, 0.0);
        let points = tracker.detect(&prev);

        let (vector, _) = tracker.track(&prev, &next, &points);
        assert!((vector.x() - 10.0).abs() < 1.5, "vector {vector:?}");
        assert!(vector.y().abs() < 1.5, "vector {vector:?}");
    }

    #[test]
    fn low_contrast_motion_is_tracked() {
        let mut tracker = MotionTracker::new();
        let prev = scene_with(100.0, 30.0, 0.0, 0.0);
        let next = scene_with(100.0, 30.0, 10.0, 0.0);
        let points = tracker.detect(&prev);
        assert!(!points.is_empty());

        let (vector, _) = tracker.track(&prev, &next, &points);
        assert!((vector.x() - 10.0).abs() < 1.5, "vector {vector:?}");
        assert!(vector.y().abs() < 1.5, "vector {vector:?}");
    }

    #[test]
    fn process_bootstraps_then_tracks() {
        let mut tracker = MotionTracker::new();
        assert_eq!(tracker.process(scene(0.0, 0.0)), ControlVector::ZERO);
        assert!(!tracker.points().is_empty());

        let out = tracker.process(scene(0.0, 0.0));
        assert_eq!(out, ControlVector::ZERO);
    }

    #[test]
    fn size_change_rebootstraps() {
        let mut tracker = MotionTracker::new();
        tracker.process(scene(0.0, 0.0));
        let smaller = GrayFrame::from_fn(64, 48, |x, y| if x > 20 && y > 20 { 200 } else { 10 });
        assert_eq!(tracker.process(smaller), ControlVector::ZERO);
        assert!(tracker.points().iter().all(|p| p.x < 64.0 && p.y < 48.0));
    }
}

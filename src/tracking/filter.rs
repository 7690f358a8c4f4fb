//! Deviation thresholding and moving-average smoothing

use std::collections::VecDeque;

use glam::Vec2;

/// Displacements at or below this magnitude (pixels) are treated as noise
pub const MOTION_THRESHOLD: f32 = 8.0;

/// Number of frame means the moving average spans
pub const HISTORY_LEN: usize = 3;

/// Divisor mapping pixel-scale motion onto controller range
pub const OUTPUT_SCALE: f32 = 30.0;

/// Smoothed tracker output for one frame, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlVector(pub Vec2);

impl ControlVector {
    pub const ZERO: ControlVector = ControlVector(Vec2::ZERO);

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    /// The `(x / 30, y / 30)` pair that goes on the wire
    pub fn to_controller_scale(&self) -> (f32, f32) {
        (self.0.x / OUTPUT_SCALE, self.0.y / OUTPUT_SCALE)
    }
}

/// Mean of the samples whose magnitude exceeds `threshold`, or zero if none do
pub fn intentional_mean(samples: &[Vec2], threshold: f32) -> Vec2 {
    let (sum, count) = samples
        .iter()
        .filter(|d| d.length() > threshold)
        .fold((Vec2::ZERO, 0usize), |(sum, count), d| (sum + *d, count + 1));

    if count == 0 {
        Vec2::ZERO
    } else {
        sum / count as f32
    }
}

/// Thresholds each frame's displacements and averages the last few frames
#[derive(Debug, Clone)]
pub struct MotionFilter {
    threshold: f32,
    capacity: usize,
    history: VecDeque<Vec2>,
}

impl MotionFilter {
    pub fn new(threshold: f32, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            threshold,
            capacity,
            history: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Feed one frame's displacement samples and return the smoothed output
    ///
    /// A frame with no intentional motion still enters the history as zero.
    pub fn push(&mut self, samples: &[Vec2]) -> ControlVector {
        let mean = intentional_mean(samples, self.threshold);
        self.history.push_back(mean);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.smoothed()
    }

    /// Mean of the frame means currently in the history
    pub fn smoothed(&self) -> ControlVector {
        if self.history.is_empty() {
            return ControlVector::ZERO;
        }
        let sum: Vec2 = self.history.iter().copied().sum();
        ControlVector(sum / self.history.len() as f32)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for MotionFilter {
    fn default() -> Self {
        Self::new(MOTION_THRESHOLD, HISTORY_LEN)
    }
}

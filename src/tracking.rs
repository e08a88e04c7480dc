//! Appearance-based tracking over an image sequence.
//!
//! The tracker holds a frame sequence and a feature detector and estimates
//! the planar pose of a patch through the sequence. Pose refinement against
//! an appearance cost is not wired up yet, so [`EuclideanTracker::run`]
//! currently reports the identity pose.

use crate::manifold::{LieGroup, SE2};

/// A grayscale frame, row-major `f32` intensities.
#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
}

impl Frame {
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Self {
        assert_eq!(pixels.len(), width * height);
        Frame {
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

    pub fn pixel(&self, x: usize, y: usize) -> f32 {
        self.pixels[y * self.width + x]
    }
}

/// Maps an image patch to a feature vector for appearance comparison.
pub trait Detector {
    fn encode(&self, frame: &Frame) -> Vec<f64>;
}

/// Tracks a fixed-size patch through a frame sequence.
pub struct EuclideanTracker<D: Detector> {
    frames: Vec<Frame>,
    detector: D,
    patch_size: (usize, usize),
}

impl<D: Detector> EuclideanTracker<D> {
    pub fn new(frames: Vec<Frame>, detector: D, patch_size: (usize, usize)) -> Self {
        EuclideanTracker {
            frames,
            detector,
            patch_size,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn patch_size(&self) -> (usize, usize) {
        self.patch_size
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Estimate the patch pose in the last frame given its pose in the
    /// first.
    ///
    /// TODO: refine the pose per frame by descending the feature-space
    /// distance between the detector's encoding of the warped patch and the
    /// reference encoding.
    pub fn run(&self, _start: &SE2) -> SE2 {
        SE2::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MeanDetector;

    impl Detector for MeanDetector {
        fn encode(&self, frame: &Frame) -> Vec<f64> {
            let sum: f64 = frame.pixels.iter().map(|&p| f64::from(p)).sum();
            vec![sum / frame.pixels.len() as f64]
        }
    }

    #[test]
    fn test_frame_indexing() {
        let frame = Frame::new(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(frame.pixel(0, 0), 0.0);
        assert_eq!(frame.pixel(2, 0), 2.0);
        assert_eq!(frame.pixel(1, 1), 4.0);
    }

    #[test]
    fn test_tracker_reports_identity() {
        let frames = vec![Frame::new(2, 2, vec![0.5; 4]); 3];
        let tracker = EuclideanTracker::new(frames, MeanDetector, (2, 2));
        assert_eq!(tracker.num_frames(), 3);
        assert_eq!(tracker.patch_size(), (2, 2));
        let pose = tracker.run(&SE2::from_xy_angle(1.0, 2.0, 0.3));
        assert_eq!(pose, SE2::identity());
    }

    #[test]
    fn test_detector_encoding() {
        let frame = Frame::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let encoding = MeanDetector.encode(&frame);
        assert_eq!(encoding, vec![2.5]);
    }
}

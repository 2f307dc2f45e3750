use serde::{Deserialize, Serialize};

use crate::constants::KEYPOINT_COUNT;

/// A single 2D landmark in logical pixel space (origin top-left)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// COCO keypoint indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

/// One detection's full skeleton.
///
/// A frame always holds exactly [`KEYPOINT_COUNT`] keypoints; anything else is
/// rejected at construction, so "no detection" is expressed as `Option<KeypointFrame>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeypointFrame([Keypoint; KEYPOINT_COUNT]);

impl KeypointFrame {
    pub fn new(points: [Keypoint; KEYPOINT_COUNT]) -> Self {
        Self(points)
    }

    /// Build a frame from a slice; `None` unless it holds exactly 17 keypoints.
    pub fn from_slice(points: &[Keypoint]) -> Option<Self> {
        let points: [Keypoint; KEYPOINT_COUNT] = points.try_into().ok()?;
        Some(Self(points))
    }

    /// A frame with every keypoint at the origin.
    pub fn zeroed() -> Self {
        Self([Keypoint::default(); KEYPOINT_COUNT])
    }

    pub fn point(&self, index: KeypointIndex) -> Keypoint {
        self.0[index as usize]
    }

    /// Bounds-checked raw access
    pub fn get(&self, index: usize) -> Option<Keypoint> {
        self.0.get(index).copied()
    }

    pub fn set(&mut self, index: KeypointIndex, point: Keypoint) {
        self.0[index as usize] = point;
    }

    pub fn points(&self) -> &[Keypoint] {
        &self.0
    }

    /// Left and right wrist, in that order
    pub fn wrists(&self) -> (Keypoint, Keypoint) {
        (
            self.point(KeypointIndex::LeftWrist),
            self.point(KeypointIndex::RightWrist),
        )
    }

    /// Independent per-axis affine scale, e.g. producer resolution to play area.
    pub fn scaled(mut self, sx: f32, sy: f32) -> Self {
        for p in self.0.iter_mut() {
            p.x *= sx;
            p.y *= sy;
        }
        self
    }
}

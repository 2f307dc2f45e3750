use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{KEYPOINT_COUNT, LEVEL_THRESHOLD, SQUAT_MAX_DEG, SQUAT_MIN_DEG};
use crate::keypoint::{Keypoint, KeypointFrame, KeypointIndex};
use crate::window::SmoothingWindow;

/// Target poses the player is asked to strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoseLabel {
    /// Both wrists above the nose
    HandsUp,
    /// Shoulders level and wrists level
    TPose,
    /// Left knee bent to roughly a right angle
    Squat,
}

impl PoseLabel {
    pub const ALL: [PoseLabel; 3] = [PoseLabel::HandsUp, PoseLabel::TPose, PoseLabel::Squat];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoseLabel::HandsUp => "hands-up",
            PoseLabel::TPose => "t-pose",
            PoseLabel::Squat => "squat",
        }
    }

    pub fn matches(&self, frame: &KeypointFrame) -> bool {
        self.matches_points(frame.points())
    }

    /// Predicate over raw keypoints; anything but a full 17-point skeleton is
    /// insufficient data and never matches.
    pub fn matches_points(&self, points: &[Keypoint]) -> bool {
        if points.len() < KEYPOINT_COUNT {
            return false;
        }
        let at = |i: KeypointIndex| points[i as usize];
        match self {
            PoseLabel::HandsUp => {
                let nose = at(KeypointIndex::Nose);
                at(KeypointIndex::LeftWrist).y < nose.y && at(KeypointIndex::RightWrist).y < nose.y
            }
            PoseLabel::TPose => {
                let shoulders = (at(KeypointIndex::LeftShoulder).y - at(KeypointIndex::RightShoulder).y).abs();
                let wrists = (at(KeypointIndex::LeftWrist).y - at(KeypointIndex::RightWrist).y).abs();
                shoulders < LEVEL_THRESHOLD && wrists < LEVEL_THRESHOLD
            }
            PoseLabel::Squat => joint_angle(
                at(KeypointIndex::LeftHip),
                at(KeypointIndex::LeftKnee),
                at(KeypointIndex::LeftAnkle),
            )
            .map_or(false, |deg| SQUAT_MIN_DEG < deg && deg < SQUAT_MAX_DEG),
        }
    }

    /// Pick a label uniformly from the set, excluding `previous`.
    pub fn next_after<R: Rng + ?Sized>(previous: Option<PoseLabel>, rng: &mut R) -> PoseLabel {
        let candidates: Vec<PoseLabel> = Self::ALL
            .iter()
            .copied()
            .filter(|l| Some(*l) != previous)
            .collect();
        // ALL has more than one label, so at least one candidate remains
        *candidates.choose(rng).unwrap_or(&PoseLabel::HandsUp)
    }
}

impl std::str::FromStr for PoseLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hands-up" | "hands_up" => Ok(PoseLabel::HandsUp),
            "t-pose" | "t_pose" => Ok(PoseLabel::TPose),
            "squat" => Ok(PoseLabel::Squat),
            _ => Err(format!(
                "Invalid pose label: '{}'. Must be 'hands-up', 't-pose', or 'squat'",
                s
            )),
        }
    }
}

impl std::fmt::Display for PoseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interior angle at `b` (degrees) for the chain a-b-c.
///
/// Uses cos(θ) = (v1 · v2) / (|v1| × |v2|). `None` if either limb has zero length.
pub fn joint_angle(a: Keypoint, b: Keypoint, c: Keypoint) -> Option<f32> {
    let v1 = (a.x - b.x, a.y - b.y);
    let v2 = (c.x - b.x, c.y - b.y);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if mag1 < f32::EPSILON || mag2 < f32::EPSILON {
        return None;
    }

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Debounced classifier for the current target pose
#[derive(Debug, Clone)]
pub struct PoseClassifier {
    target: PoseLabel,
    window: SmoothingWindow,
}

impl PoseClassifier {
    pub fn new(target: PoseLabel) -> Self {
        Self {
            target,
            window: SmoothingWindow::new(),
        }
    }

    /// Single-frame predicate, no smoothing
    pub fn classify(frame: &KeypointFrame, label: PoseLabel) -> bool {
        label.matches(frame)
    }

    /// Record one raw result and return the debounced decision
    pub fn observe(&mut self, raw_match: bool) -> bool {
        self.window.push(raw_match);
        self.window.decision()
    }

    /// Classify `frame` against the current target and observe the result
    pub fn update(&mut self, frame: &KeypointFrame) -> bool {
        let raw = Self::classify(frame, self.target);
        self.observe(raw)
    }

    pub fn reset_window(&mut self) {
        self.window.clear();
    }

    pub fn target(&self) -> PoseLabel {
        self.target
    }

    /// Switch target; the window always restarts with the new label
    pub fn set_target(&mut self, target: PoseLabel) {
        self.target = target;
        self.reset_window();
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frame_with(points: &[(KeypointIndex, f32, f32)]) -> KeypointFrame {
        let mut frame = KeypointFrame::zeroed();
        for &(idx, x, y) in points {
            frame.set(idx, Keypoint::new(x, y));
        }
        frame
    }

    /// Hip straight above the knee, ankle rotated `deg` away from the thigh.
    fn leg_at(deg: f32) -> KeypointFrame {
        let knee = (400.0f32, 400.0f32);
        let rad = deg.to_radians();
        frame_with(&[
            (KeypointIndex::LeftHip, knee.0, knee.1 - 100.0),
            (KeypointIndex::LeftKnee, knee.0, knee.1),
            (KeypointIndex::LeftAnkle, knee.0 + 100.0 * rad.sin(), knee.1 - 100.0 * rad.cos()),
        ])
    }

    #[test]
    fn short_inputs_never_match() {
        for n in 0..KEYPOINT_COUNT {
            let pts = vec![Keypoint::new(0.0, 0.0); n];
            for label in PoseLabel::ALL {
                assert!(!label.matches_points(&pts), "{} matched {} points", label, n);
            }
        }
    }

    #[test]
    fn hands_up_requires_both_wrists_above_nose() {
        let up = frame_with(&[
            (KeypointIndex::Nose, 400.0, 200.0),
            (KeypointIndex::LeftWrist, 350.0, 100.0),
            (KeypointIndex::RightWrist, 450.0, 120.0),
        ]);
        assert!(PoseClassifier::classify(&up, PoseLabel::HandsUp));

        let one_down = frame_with(&[
            (KeypointIndex::Nose, 400.0, 200.0),
            (KeypointIndex::LeftWrist, 350.0, 100.0),
            (KeypointIndex::RightWrist, 450.0, 200.0),
        ]);
        assert!(!PoseClassifier::classify(&one_down, PoseLabel::HandsUp));
    }

    #[test]
    fn t_pose_threshold_is_strict() {
        let level = frame_with(&[
            (KeypointIndex::LeftShoulder, 300.0, 200.0),
            (KeypointIndex::RightShoulder, 500.0, 229.0),
            (KeypointIndex::LeftWrist, 100.0, 200.0),
            (KeypointIndex::RightWrist, 700.0, 229.0),
        ]);
        assert!(PoseLabel::TPose.matches(&level));

        let tilted = frame_with(&[
            (KeypointIndex::LeftShoulder, 300.0, 200.0),
            (KeypointIndex::RightShoulder, 500.0, 230.0),
            (KeypointIndex::LeftWrist, 100.0, 200.0),
            (KeypointIndex::RightWrist, 700.0, 229.0),
        ]);
        assert!(!PoseLabel::TPose.matches(&tilted));

        let arms_tilted = frame_with(&[
            (KeypointIndex::LeftShoulder, 300.0, 200.0),
            (KeypointIndex::RightShoulder, 500.0, 229.0),
            (KeypointIndex::LeftWrist, 100.0, 200.0),
            (KeypointIndex::RightWrist, 700.0, 230.0),
        ]);
        assert!(!PoseLabel::TPose.matches(&arms_tilted));
    }

    #[test]
    fn squat_bounds_are_exclusive() {
        assert!(PoseLabel::Squat.matches(&leg_at(90.0)));
        assert!(!PoseLabel::Squat.matches(&leg_at(69.0)));
        assert!(!PoseLabel::Squat.matches(&leg_at(111.0)));
        assert!(!PoseLabel::Squat.matches(&leg_at(180.0)));
    }

    #[test]
    fn squat_with_collapsed_limb_is_false() {
        // all-zero frame: hip, knee and ankle coincide
        assert!(!PoseLabel::Squat.matches(&KeypointFrame::zeroed()));
    }

    #[test]
    fn joint_angle_right_angle() {
        let angle = joint_angle(
            Keypoint::new(0.0, 0.0),
            Keypoint::new(0.5, 0.0),
            Keypoint::new(0.5, 0.5),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn next_label_never_repeats() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut current = PoseLabel::next_after(None, &mut rng);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let next = PoseLabel::next_after(Some(current), &mut rng);
            assert_ne!(next, current);
            seen.insert(next);
            current = next;
        }
        assert_eq!(seen.len(), PoseLabel::ALL.len());
    }

    #[test]
    fn set_target_resets_window() {
        let mut classifier = PoseClassifier::new(PoseLabel::HandsUp);
        assert!(classifier.observe(true));
        assert!(classifier.observe(true));
        classifier.set_target(PoseLabel::Squat);
        assert!(classifier.window().is_empty());
        assert!(!classifier.observe(false));
    }

    #[test]
    fn label_parsing() {
        assert_eq!("hands_up".parse::<PoseLabel>().unwrap(), PoseLabel::HandsUp);
        assert_eq!("T-Pose".parse::<PoseLabel>().unwrap(), PoseLabel::TPose);
        assert!("cartwheel".parse::<PoseLabel>().is_err());
        assert_eq!(PoseLabel::Squat.to_string(), "squat");
    }
}

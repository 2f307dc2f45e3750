//! Producer line format.
//!
//! One JSON object per line:
//! `{"poses": [{"keypoints": [[x, y], ...17 pairs]}, ...]}`
//! Coordinates are in the producer's native resolution. Extra values per
//! keypoint (confidence) and unknown fields are ignored.

use pose_core::constants::KEYPOINT_COUNT;
use pose_core::{Keypoint, KeypointFrame};
use serde::Deserialize;

use crate::error::RecordError;

#[derive(Debug, Deserialize)]
struct ProducerRecord {
    /// Absent and `null` both mean no detection
    #[serde(default)]
    poses: Option<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    keypoints: Vec<Vec<f32>>,
}

/// Parse one line into the first detection's frame, scaled by (sx, sy).
///
/// `Ok(None)` when the record carries no detection.
pub fn parse_record(line: &str, scale: (f32, f32)) -> Result<Option<KeypointFrame>, RecordError> {
    let record: ProducerRecord = serde_json::from_str(line)?;

    let Some(first) = record.poses.as_deref().and_then(|poses| poses.first()) else {
        return Ok(None);
    };

    if first.keypoints.len() != KEYPOINT_COUNT {
        return Err(RecordError::KeypointCount {
            found: first.keypoints.len(),
        });
    }

    let mut points = [Keypoint::default(); KEYPOINT_COUNT];
    for (index, pair) in first.keypoints.iter().enumerate() {
        match pair.as_slice() {
            [x, y, ..] => points[index] = Keypoint::new(*x, *y),
            _ => return Err(RecordError::ShortPair { index }),
        }
    }

    Ok(Some(KeypointFrame::new(points).scaled(scale.0, scale.1)))
}

use pose_core::{Keypoint, KeypointFrame, KeypointIndex};

use super::SourceRead;

/// Something that can report a 2D pointer position in arena coordinates.
pub trait PointerInput {
    /// `None` while no position is available
    fn position(&mut self) -> Option<(f32, f32)>;
}

/// A pointer parked at one spot
#[derive(Debug, Clone, Copy)]
pub struct FixedPointer(pub f32, pub f32);

impl PointerInput for FixedPointer {
    fn position(&mut self) -> Option<(f32, f32)> {
        Some((self.0, self.1))
    }
}

/// Adapts any closure into a pointer
pub struct FnPointer<F>(pub F);

impl<F> PointerInput for FnPointer<F>
where
    F: FnMut() -> Option<(f32, f32)>,
{
    fn position(&mut self) -> Option<(f32, f32)> {
        (self.0)()
    }
}

/// Camera-free pose source: both wrists follow the pointer, every other
/// keypoint stays at the origin.
pub struct SyntheticSource {
    pointer: Box<dyn PointerInput + Send>,
}

impl SyntheticSource {
    pub fn new(pointer: impl PointerInput + Send + 'static) -> Self {
        Self {
            pointer: Box::new(pointer),
        }
    }

    pub fn read(&mut self) -> SourceRead {
        match self.pointer.position() {
            Some((x, y)) => SourceRead::Frame(frame_at(x, y)),
            None => SourceRead::NoFrame,
        }
    }
}

fn frame_at(x: f32, y: f32) -> KeypointFrame {
    let mut frame = KeypointFrame::zeroed();
    let hand = Keypoint::new(x, y);
    frame.set(KeypointIndex::LeftWrist, hand);
    frame.set(KeypointIndex::RightWrist, hand);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrists_follow_pointer() {
        let mut source = SyntheticSource::new(FixedPointer(120.0, 340.0));
        let SourceRead::Frame(frame) = source.read() else {
            panic!("expected a frame");
        };
        let (left, right) = frame.wrists();
        assert_eq!(left, Keypoint::new(120.0, 340.0));
        assert_eq!(right, Keypoint::new(120.0, 340.0));
        assert_eq!(frame.point(KeypointIndex::Nose), Keypoint::default());
        assert_eq!(frame.points().len(), 17);
    }

    #[test]
    fn missing_pointer_gives_no_frame() {
        let mut source = SyntheticSource::new(FnPointer(|| -> Option<(f32, f32)> { None }));
        assert!(matches!(source.read(), SourceRead::NoFrame));
    }
}

//! Pose sources: where keypoint frames come from each tick.

mod process;
mod record;
mod synthetic;

use std::process::ExitStatus;
use std::time::Duration;

use pose_core::KeypointFrame;

use crate::config::GameConfig;
use crate::error::{RecordError, StartError};

pub use process::ProcessSource;
pub use record::parse_record;
pub use synthetic::{FixedPointer, FnPointer, PointerInput, SyntheticSource};

/// Outcome of one bounded read
#[derive(Debug)]
pub enum SourceRead {
    Frame(KeypointFrame),
    /// Nothing usable this tick; the normal, frequent case
    NoFrame,
    /// A record arrived but could not be parsed
    Malformed(RecordError),
    /// The producer went away; reported once, `NoFrame` afterwards
    Terminated { status: Option<ExitStatus> },
}

impl SourceRead {
    pub fn into_frame(self) -> Option<KeypointFrame> {
        match self {
            SourceRead::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

/// Either the real producer or the pointer-driven stand-in
pub enum PoseSource {
    Process(ProcessSource),
    Synthetic(SyntheticSource),
}

impl PoseSource {
    /// Launch the external producer described by `config`
    pub fn start(config: &GameConfig) -> Result<Self, StartError> {
        let source = ProcessSource::start(&config.producer, config.frame_scale())?;
        Ok(PoseSource::Process(source))
    }

    pub fn synthetic(pointer: impl PointerInput + Send + 'static) -> Self {
        PoseSource::Synthetic(SyntheticSource::new(pointer))
    }

    pub fn read(&mut self) -> SourceRead {
        match self {
            PoseSource::Process(source) => source.read(),
            PoseSource::Synthetic(source) => source.read(),
        }
    }

    /// Like [`read`](Self::read), but never waits longer than `budget`
    pub fn read_within(&mut self, budget: Duration) -> SourceRead {
        match self {
            PoseSource::Process(source) => source.read_within(budget),
            PoseSource::Synthetic(source) => source.read(),
        }
    }

    /// Latest frame, or `None` for any kind of miss
    pub fn poll(&mut self) -> Option<KeypointFrame> {
        self.read().into_frame()
    }

    pub fn is_alive(&mut self) -> bool {
        match self {
            PoseSource::Process(source) => source.is_alive(),
            PoseSource::Synthetic(_) => true,
        }
    }

    pub fn shutdown(&mut self) {
        if let PoseSource::Process(source) = self {
            source.shutdown();
        }
    }
}

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// The producer could not be brought up; fatal before the first tick
#[derive(Debug, Error)]
pub enum StartError {
    #[error("producer command is empty")]
    EmptyCommand,
    #[error("failed to launch producer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("producer stdout was not captured")]
    MissingStdout,
    #[error("producer exited during warm-up ({status})")]
    ExitedDuringWarmup { status: ExitStatus },
}

/// One producer line that could not be turned into a frame
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("detection has {found} keypoints, expected 17")]
    KeypointCount { found: usize },
    #[error("keypoint {index} has fewer than two coordinates")]
    ShortPair { index: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Anything that stops a match from being played at all
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Start(#[from] StartError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

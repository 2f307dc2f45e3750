//! Game rules for the pose game: keypoint model, pose predicates, debounce
//! window and catch-mode collision. No I/O lives here.

pub mod constants;
pub mod keypoint;
pub mod physics;
pub mod pose;
pub mod window;

use serde::{Deserialize, Serialize};

pub use keypoint::{Keypoint, KeypointFrame, KeypointIndex};
pub use physics::{ArenaConfig, CollisionEngine, HandState, Hitbox, MovingObject, ObjectId};
pub use pose::{joint_angle, PoseClassifier, PoseLabel};
pub use window::SmoothingWindow;

/// Which game is being played
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Strike the displayed target pose
    #[default]
    Pose,
    /// Catch falling balls with your hands
    Catch,
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pose" => Ok(GameMode::Pose),
            "catch" => Ok(GameMode::Catch),
            _ => Err(format!("Invalid game mode: '{}'. Must be 'pose' or 'catch'", s)),
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Pose => write!(f, "pose"),
            GameMode::Catch => write!(f, "catch"),
        }
    }
}

/// Game loop lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Initializing,
    Running,
    Finalizing,
    Terminated,
}

/// Read-only view of one tick, handed to the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub score: u32,
    pub elapsed_secs: f32,
    pub remaining_secs: f32,
    /// Pose to strike (pose mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PoseLabel>,
    /// Balls still in play (catch mode only)
    pub objects: Vec<MovingObject>,
    pub hands: HandState,
    /// No frame for longer than the grace period
    pub no_player_detected: bool,
    pub producer_alive: bool,
}

/// Summary of a finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub mode: GameMode,
    pub final_phase: GamePhase,
    pub score: u32,
    pub ticks: u64,
    pub frames_received: u64,
    pub malformed_records: u64,
    pub duration_secs: f32,
    /// Ended by a quit request before the deadline
    pub quit_early: bool,
    /// The producer died at some point during the match
    pub producer_lost: bool,
}

// Game configuration constants
// These are the defaults; the host config can override most of them per match.

/// Logical play area width (pixels)
pub const PLAY_WIDTH: f32 = 800.0;

/// Logical play area height (pixels)
pub const PLAY_HEIGHT: f32 = 600.0;

/// Producer native frame width (pixels)
pub const SOURCE_WIDTH: f32 = 640.0;

/// Producer native frame height (pixels)
pub const SOURCE_HEIGHT: f32 = 640.0;

/// Number of COCO keypoints in one detection
pub const KEYPOINT_COUNT: usize = 17;

/// Capacity of the debounce window (ticks)
pub const SMOOTHING_WINDOW: usize = 5;

/// Debounce ratio as an integer fraction: matched iff trues/len >= 3/5
pub const MATCH_RATIO_NUM: usize = 3;
pub const MATCH_RATIO_DEN: usize = 5;

/// Maximum vertical difference (pixels) for a pair of joints to count as level
pub const LEVEL_THRESHOLD: f32 = 30.0;

/// Exclusive knee angle range (degrees) for a squat
pub const SQUAT_MIN_DEG: f32 = 70.0;
pub const SQUAT_MAX_DEG: f32 = 110.0;

/// Points for completing a target pose
pub const POSE_POINTS: u32 = 10;

/// Points per caught ball
pub const CATCH_POINTS: u32 = 1;

/// Hand hitbox edge length (pixels)
pub const HAND_SIZE: f32 = 80.0;

/// Ball radius (pixels)
pub const BALL_RADIUS: f32 = 20.0;

/// Ball fall speed (pixels/second)
pub const BALL_SPEED: f32 = 200.0;

/// Horizontal spawn inset from each side of the play area (pixels)
pub const SPAWN_INSET: f32 = 50.0;

/// Initial spawn interval (seconds)
pub const SPAWN_INTERVAL: f32 = 2.0;

/// Spawn interval reduction per elapsed second of match time
pub const SPAWN_DECAY: f32 = 0.02;

/// Spawn interval never drops below this (seconds)
pub const MIN_SPAWN_INTERVAL: f32 = 1.0;

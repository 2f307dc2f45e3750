use std::fs;
use std::path::Path;
use std::time::Duration;

use pose_core::constants::{MIN_SPAWN_INTERVAL, SOURCE_HEIGHT, SOURCE_WIDTH};
use pose_core::{ArenaConfig, GameMode};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Refuse config files larger than this
const MAX_CONFIG_SIZE: u64 = 1024 * 1024; // 1 MB

/// External pose producer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProducerConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Resolution the producer reports keypoints in
    pub native_width: f32,
    pub native_height: f32,
    /// Wait after launch before the first poll
    pub warmup_ms: u64,
    /// Longest a single poll may block
    pub poll_timeout_ms: u64,
    /// Time allowed for a graceful exit before the producer is killed
    pub shutdown_grace_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "rpicam-hello".to_string(),
                "-t".to_string(),
                "0".to_string(),
                "--post-process-file".to_string(),
                "/usr/share/rpi-camera-assets/hailo_yolov8_pose.json".to_string(),
            ],
            native_width: SOURCE_WIDTH,
            native_height: SOURCE_HEIGHT,
            warmup_ms: 2000,
            poll_timeout_ms: 100,
            shutdown_grace_ms: 2000,
        }
    }
}

impl ProducerConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Per-match settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub mode: GameMode,
    /// Match length in seconds
    pub duration_secs: f32,
    /// Fixed update rate
    pub tick_hz: u32,
    /// How long the final score stays up
    pub end_screen_secs: f32,
    /// Seconds without a frame before "no player detected" is shown
    pub no_player_grace_secs: f32,
    /// Fixed RNG seed for reproducible matches
    pub seed: Option<u64>,
    /// Use the pointer-driven source instead of launching the producer
    pub mock: bool,
    pub producer: ProducerConfig,
    pub arena: ArenaConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Pose,
            duration_secs: 60.0,
            tick_hz: 60,
            end_screen_secs: 3.0,
            no_player_grace_secs: 5.0,
            seed: None,
            mock: false,
            producer: ProducerConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load a JSON config; missing fields fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read_err = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(path).map_err(read_err)?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(ConfigError::Invalid(format!(
                "config file too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let raw = fs::read_to_string(path).map_err(read_err)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.tick_hz == 0 {
            return invalid("tick_hz must be at least 1");
        }
        if !(self.duration_secs > 0.0) {
            return invalid("duration_secs must be positive");
        }
        if self.end_screen_secs < 0.0 || self.no_player_grace_secs < 0.0 {
            return invalid("end_screen_secs and no_player_grace_secs must not be negative");
        }
        if !(self.arena.width > 0.0 && self.arena.height > 0.0) {
            return invalid("arena dimensions must be positive");
        }
        if !(self.producer.native_width > 0.0 && self.producer.native_height > 0.0) {
            return invalid("producer resolution must be positive");
        }
        if self.arena.spawn_inset < 0.0 || self.arena.spawn_inset * 2.0 > self.arena.width {
            return invalid("spawn_inset must fit inside half the arena width");
        }
        if self.arena.min_spawn_interval < MIN_SPAWN_INTERVAL {
            return invalid("min_spawn_interval must be at least 1.0");
        }
        if !self.mock && self.producer.command.is_empty() {
            return invalid("producer command is empty");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz as f64)
    }

    /// Producer-to-arena scale factors (x, y)
    pub fn frame_scale(&self) -> (f32, f32) {
        (
            self.arena.width / self.producer.native_width,
            self.arena.height / self.producer.native_height,
        )
    }
}

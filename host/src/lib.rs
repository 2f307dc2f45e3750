//! Pose game host: pulls keypoint frames from a pose producer and drives the
//! fixed-tick match loop.

pub mod clock;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod render;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GameConfig, ProducerConfig};
pub use error::{ConfigError, GameError, RecordError, StartError};
pub use game_loop::GameLoop;
pub use render::{LogRenderer, Renderer};
pub use source::{FixedPointer, FnPointer, PointerInput, PoseSource, SourceRead};

use pose_core::MatchReport;

/// Start the configured source and play one match with the wall clock.
///
/// `mock` selects the synthetic source driven by `pointer`; otherwise the
/// external producer is launched and `pointer` is ignored.
pub fn play_match<R, P>(config: GameConfig, renderer: R, pointer: P) -> Result<MatchReport, GameError>
where
    R: Renderer,
    P: PointerInput + Send + 'static,
{
    config.validate()?;
    let source = if config.mock {
        tracing::info!("Using synthetic pose source");
        PoseSource::synthetic(pointer)
    } else {
        PoseSource::start(&config)?
    };
    Ok(GameLoop::new(config, source, renderer, SystemClock::new()).run())
}

use pose_core::{GameMode, GameSnapshot};
use tracing::info;

/// Whatever draws the game. Receives one snapshot per tick and may ask the
/// loop to stop.
pub trait Renderer {
    fn present(&mut self, snapshot: &GameSnapshot);

    /// Called once when the match ends, before the end screen delay
    fn present_end_screen(&mut self, snapshot: &GameSnapshot) {
        self.present(snapshot);
    }

    fn quit_requested(&mut self) -> bool {
        false
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn present(&mut self, snapshot: &GameSnapshot) {
        (**self).present(snapshot)
    }

    fn present_end_screen(&mut self, snapshot: &GameSnapshot) {
        (**self).present_end_screen(snapshot)
    }

    fn quit_requested(&mut self) -> bool {
        (**self).quit_requested()
    }
}

/// Headless renderer: one status line per second of match time
#[derive(Debug, Default)]
pub struct LogRenderer {
    last_logged_second: Option<u32>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for LogRenderer {
    fn present(&mut self, s: &GameSnapshot) {
        let second = s.elapsed_secs as u32;
        if self.last_logged_second == Some(second) {
            return;
        }
        self.last_logged_second = Some(second);

        let detail = match (s.mode, s.target) {
            (GameMode::Pose, Some(target)) => format!("match pose: {}", target),
            _ => format!("balls: {}", s.objects.len()),
        };
        info!(
            "Score: {} | Time: {}s | {}{}",
            s.score,
            s.remaining_secs.ceil() as u32,
            detail,
            if s.no_player_detected { " | no player detected" } else { "" }
        );
    }

    fn present_end_screen(&mut self, s: &GameSnapshot) {
        info!("Game over! Final score: {}", s.score);
    }
}

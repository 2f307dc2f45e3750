use std::time::Duration;

use pose_core::constants::POSE_POINTS;
use pose_core::{
    CollisionEngine, GameMode, GamePhase, GameSnapshot, HandState, KeypointFrame, MatchReport,
    PoseClassifier, PoseLabel,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::GameConfig;
use crate::render::Renderer;
use crate::source::{PoseSource, SourceRead};

/// Fixed-tick match driver.
///
/// Owns the pose source for the whole match and releases it when the match
/// ends. One source read per tick; all state changes happen on this thread.
pub struct GameLoop<R: Renderer, C: Clock> {
    config: GameConfig,
    source: PoseSource,
    renderer: R,
    clock: C,
    rng: StdRng,

    phase: GamePhase,
    score: u32,
    classifier: PoseClassifier,
    collision: CollisionEngine,
    hands: HandState,

    started_at: Duration,
    elapsed: Duration,
    /// Start of the previous tick; physics steps by the real gap
    last_tick_at: Option<Duration>,
    last_frame_at: Duration,
    producer_alive: bool,

    ticks: u64,
    frames: u64,
    malformed: u64,
    producer_lost: bool,
    quit_early: bool,
}

impl<R: Renderer, C: Clock> GameLoop<R, C> {
    /// The source must already be started; its warm-up is part of `start`.
    pub fn new(config: GameConfig, source: PoseSource, renderer: R, clock: C) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let first_target = PoseLabel::next_after(None, &mut rng);
        let now = clock.now();

        Self {
            classifier: PoseClassifier::new(first_target),
            collision: CollisionEngine::new(config.arena),
            hands: HandState::resting(&config.arena),
            config,
            source,
            renderer,
            clock,
            rng,
            phase: GamePhase::Initializing,
            score: 0,
            started_at: now,
            elapsed: Duration::ZERO,
            last_tick_at: None,
            last_frame_at: now,
            producer_alive: true,
            ticks: 0,
            frames: 0,
            malformed: 0,
            producer_lost: false,
            quit_early: false,
        }
    }

    /// Play the match to completion and return its summary
    pub fn run(mut self) -> MatchReport {
        self.begin();
        while self.phase == GamePhase::Running {
            self.tick();
        }
        self.finish();
        self.report()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn begin(&mut self) {
        if self.phase != GamePhase::Initializing {
            return;
        }
        let now = self.clock.now();
        self.started_at = now;
        self.last_frame_at = now;
        self.phase = GamePhase::Running;
        info!(
            "Match started: mode={}, duration={}s, tick={}Hz",
            self.config.mode, self.config.duration_secs, self.config.tick_hz
        );
        if self.config.mode == GameMode::Pose {
            info!("Match pose: {}", self.classifier.target());
        }
    }

    /// One fixed step: deadline and quit checks, one read, state update,
    /// present, then sleep out the rest of the tick.
    pub fn tick(&mut self) {
        if self.phase != GamePhase::Running {
            return;
        }
        let tick_start = self.clock.now();
        self.elapsed = tick_start.saturating_sub(self.started_at);

        if self.elapsed.as_secs_f32() >= self.config.duration_secs {
            info!("Time is up");
            self.phase = GamePhase::Finalizing;
            return;
        }
        if self.renderer.quit_requested() {
            info!("Quit requested");
            self.quit_early = true;
            self.phase = GamePhase::Finalizing;
            return;
        }

        let interval = self.config.tick_interval();
        let next_tick = tick_start + interval;
        let dt = match self.last_tick_at.replace(tick_start) {
            Some(previous) => tick_start.saturating_sub(previous),
            None => interval,
        };

        // the read may only use what is left of this tick
        let budget = next_tick.saturating_sub(self.clock.now());
        let frame = self.take_frame(tick_start, budget);
        if let Some(frame) = &frame {
            self.hands.track(frame);
        }

        match self.config.mode {
            GameMode::Pose => self.update_pose(frame.as_ref()),
            GameMode::Catch => self.update_catch(dt),
        }

        self.ticks += 1;
        let snapshot = self.snapshot();
        self.renderer.present(&snapshot);

        let now = self.clock.now();
        if next_tick > now {
            self.clock.sleep(next_tick - now);
        }
    }

    /// The single place where source results are interpreted
    fn take_frame(&mut self, now: Duration, budget: Duration) -> Option<KeypointFrame> {
        let frame = match self.source.read_within(budget) {
            SourceRead::Frame(frame) => {
                self.frames += 1;
                self.last_frame_at = now;
                Some(frame)
            }
            SourceRead::NoFrame => None,
            SourceRead::Malformed(e) => {
                self.malformed += 1;
                warn!("Skipping malformed pose record: {}", e);
                None
            }
            SourceRead::Terminated { status } => {
                self.producer_lost = true;
                match status {
                    Some(status) => warn!("Pose producer terminated ({}); continuing without a player", status),
                    None => warn!("Pose producer closed its output; continuing without a player"),
                }
                None
            }
        };
        self.producer_alive = self.source.is_alive();
        frame
    }

    fn update_pose(&mut self, frame: Option<&KeypointFrame>) {
        let Some(frame) = frame else {
            return;
        };
        if !self.classifier.update(frame) {
            return;
        }

        let done = self.classifier.target();
        self.score = self.score.saturating_add(POSE_POINTS);
        let next = PoseLabel::next_after(Some(done), &mut self.rng);
        self.classifier.set_target(next);
        info!("Matched {}! Score: {} | Next pose: {}", done, self.score, next);
    }

    fn update_catch(&mut self, dt: Duration) {
        let now = self.elapsed.as_secs_f32();
        let dt = dt.as_secs_f32();

        if let Some(ball) = self.collision.maybe_spawn(&mut self.rng, now) {
            debug!("Spawned ball {} at x={:.0}", ball.id, ball.x);
        }
        let removed = self.collision.advance(dt);
        if !removed.is_empty() {
            debug!("Removed balls {:?}", removed);
        }

        let caught = self.collision.resolve(&self.hands);
        if caught > 0 {
            let points = caught.saturating_mul(self.collision.arena().points_per_catch);
            self.score = self.score.saturating_add(points);
            debug!("Caught {} ball(s), score={}", caught, self.score);
        }
    }

    /// Show the end screen, release the producer, stop.
    pub fn finish(&mut self) {
        if self.phase == GamePhase::Terminated {
            return;
        }
        self.phase = GamePhase::Finalizing;
        let snapshot = self.snapshot();
        self.renderer.present_end_screen(&snapshot);
        let end_screen = Duration::try_from_secs_f32(self.config.end_screen_secs).unwrap_or_default();
        self.clock.sleep(end_screen);

        self.source.shutdown();
        self.producer_alive = false;
        self.phase = GamePhase::Terminated;
        info!("Match finished with score {} after {} ticks", self.score, self.ticks);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let elapsed = self.elapsed.as_secs_f32();
        let since_frame = self.clock.now().saturating_sub(self.last_frame_at);
        let pose_mode = self.config.mode == GameMode::Pose;

        GameSnapshot {
            phase: self.phase,
            mode: self.config.mode,
            score: self.score,
            elapsed_secs: elapsed,
            remaining_secs: (self.config.duration_secs - elapsed).max(0.0),
            target: pose_mode.then(|| self.classifier.target()),
            objects: self.collision.visible().copied().collect(),
            hands: self.hands,
            no_player_detected: self.phase == GamePhase::Running
                && since_frame.as_secs_f32() > self.config.no_player_grace_secs,
            producer_alive: self.producer_alive,
        }
    }

    pub fn report(&self) -> MatchReport {
        MatchReport {
            mode: self.config.mode,
            final_phase: self.phase,
            score: self.score,
            ticks: self.ticks,
            frames_received: self.frames,
            malformed_records: self.malformed,
            duration_secs: self.elapsed.as_secs_f32(),
            quit_early: self.quit_early,
            producer_lost: self.producer_lost,
        }
    }
}

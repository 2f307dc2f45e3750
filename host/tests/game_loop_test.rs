// End-to-end matches on a manual clock so a full match runs instantly.
use host::{
    FixedPointer, FnPointer, GameConfig, GameLoop, ManualClock, PoseSource, Renderer, SystemClock,
};
use pose_core::{ArenaConfig, GameMode, GamePhase, GameSnapshot};

#[derive(Default)]
struct Recorder {
    frames: Vec<GameSnapshot>,
    end_screen: Option<GameSnapshot>,
    quit_after: Option<usize>,
}

impl Renderer for Recorder {
    fn present(&mut self, snapshot: &GameSnapshot) {
        self.frames.push(snapshot.clone());
    }

    fn present_end_screen(&mut self, snapshot: &GameSnapshot) {
        self.end_screen = Some(snapshot.clone());
    }

    fn quit_requested(&mut self) -> bool {
        self.quit_after.map_or(false, |n| self.frames.len() >= n)
    }
}

fn config(mode: GameMode, duration_secs: f32) -> GameConfig {
    GameConfig {
        mode,
        duration_secs,
        end_screen_secs: 0.0,
        seed: Some(42),
        mock: true,
        ..GameConfig::default()
    }
}

fn no_player() -> PoseSource {
    PoseSource::synthetic(FnPointer(|| -> Option<(f32, f32)> { None }))
}

#[test]
fn test_silent_source_runs_full_duration_with_zero_score() {
    let mut recorder = Recorder::default();
    let report = GameLoop::new(
        config(GameMode::Pose, 1.0),
        no_player(),
        &mut recorder,
        ManualClock::new(),
    )
    .run();

    assert_eq!(report.final_phase, GamePhase::Terminated);
    assert_eq!(report.score, 0);
    assert_eq!(report.frames_received, 0);
    assert!(!report.quit_early);
    // 60 Hz for one second, give or take the rounding of the tick length
    assert!((60..=61).contains(&report.ticks), "ticks: {}", report.ticks);
    assert!(report.duration_secs >= 0.99);

    assert_eq!(recorder.frames.len() as u64, report.ticks);
    assert!(recorder.frames.iter().all(|s| s.phase == GamePhase::Running));
    assert!(recorder.frames.iter().all(|s| s.target.is_some()));
    let end = recorder.end_screen.expect("end screen shown");
    assert_eq!(end.phase, GamePhase::Finalizing);
    assert!(end.remaining_secs < 0.01);
}

#[test]
fn test_no_player_advisory_after_grace_period() {
    let mut recorder = Recorder::default();
    GameLoop::new(
        config(GameMode::Pose, 8.0),
        no_player(),
        &mut recorder,
        ManualClock::new(),
    )
    .run();

    for s in &recorder.frames {
        if s.elapsed_secs < 4.9 {
            assert!(!s.no_player_detected, "advisory too early at {}s", s.elapsed_secs);
        } else if s.elapsed_secs > 5.1 {
            assert!(s.no_player_detected, "advisory missing at {}s", s.elapsed_secs);
        }
    }
}

#[test]
fn test_player_present_clears_advisory() {
    let mut recorder = Recorder::default();
    GameLoop::new(
        config(GameMode::Catch, 8.0),
        PoseSource::synthetic(FixedPointer(400.0, 450.0)),
        &mut recorder,
        ManualClock::new(),
    )
    .run();

    assert!(recorder.frames.iter().all(|s| !s.no_player_detected));
    assert!(recorder.frames.iter().all(|s| s.producer_alive));
}

#[test]
fn test_quit_request_ends_match_early() {
    let mut recorder = Recorder {
        quit_after: Some(10),
        ..Recorder::default()
    };
    let report = GameLoop::new(
        config(GameMode::Pose, 60.0),
        no_player(),
        &mut recorder,
        ManualClock::new(),
    )
    .run();

    assert!(report.quit_early);
    assert_eq!(report.ticks, 10);
    assert_eq!(report.final_phase, GamePhase::Terminated);
}

#[test]
fn test_catch_mode_scores_balls_under_the_hands() {
    // every ball spawns at x = 400, straight onto the parked hands
    let mut cfg = config(GameMode::Catch, 10.0);
    cfg.arena = ArenaConfig {
        spawn_inset: 400.0,
        ..ArenaConfig::default()
    };

    let mut recorder = Recorder::default();
    let report = GameLoop::new(
        cfg,
        PoseSource::synthetic(FixedPointer(400.0, 450.0)),
        &mut recorder,
        ManualClock::new(),
    )
    .run();

    assert!(report.score >= 3, "score: {}", report.score);
    assert!(recorder.frames.iter().all(|s| s.target.is_none()));

    // score never goes down and only rises by whole catches
    let scores: Vec<u32> = recorder.frames.iter().map(|s| s.score).collect();
    assert!(scores.windows(2).all(|w| w[1] >= w[0]));

    // caught balls are never drawn
    for s in &recorder.frames {
        assert!(s.objects.iter().all(|o| !o.caught));
    }
}

#[test]
fn test_catch_mode_misses_when_hands_are_elsewhere() {
    let mut cfg = config(GameMode::Catch, 10.0);
    cfg.arena = ArenaConfig {
        spawn_inset: 400.0,
        ..ArenaConfig::default()
    };

    let report = GameLoop::new(
        cfg,
        PoseSource::synthetic(FixedPointer(50.0, 450.0)),
        Recorder::default(),
        ManualClock::new(),
    )
    .run();

    assert_eq!(report.score, 0);
}

#[test]
fn test_hands_hold_resting_position_without_frames() {
    let mut recorder = Recorder::default();
    GameLoop::new(
        config(GameMode::Catch, 1.0),
        no_player(),
        &mut recorder,
        ManualClock::new(),
    )
    .run();

    let first = recorder.frames.first().expect("at least one tick").hands;
    assert!(recorder.frames.iter().all(|s| s.hands == first));
    assert_eq!((first.left.x, first.left.y), (400.0, 450.0));
}

#[test]
fn test_huge_catch_points_saturate_instead_of_overflowing() {
    let mut cfg = config(GameMode::Catch, 10.0);
    cfg.arena = ArenaConfig {
        spawn_inset: 400.0,
        points_per_catch: u32::MAX,
        ..ArenaConfig::default()
    };

    let report = GameLoop::new(
        cfg,
        PoseSource::synthetic(FixedPointer(400.0, 450.0)),
        Recorder::default(),
        ManualClock::new(),
    )
    .run();

    assert_eq!(report.score, u32::MAX);
    assert_eq!(report.final_phase, GamePhase::Terminated);
}

#[cfg(unix)]
mod with_producer {
    use super::*;

    // nose below raised, level wrists; level shoulders; left knee at 90 degrees
    const EVERY_POSE: &str = r#"{"poses":[{"keypoints":[[320,300],[0,0],[0,0],[0,0],[0,0],[300,200],[340,200],[0,0],[0,0],[280,100],[360,100],[400,400],[0,0],[400,500],[0,0],[500,500],[0,0]]}]}"#;

    fn producer_config(script: String, duration_secs: f32) -> GameConfig {
        let mut cfg = config(GameMode::Pose, duration_secs);
        cfg.mock = false;
        cfg.producer.command = vec!["sh".to_string(), "-c".to_string(), script];
        cfg.producer.warmup_ms = 100;
        cfg.producer.poll_timeout_ms = 50;
        cfg.producer.shutdown_grace_ms = 500;
        cfg
    }

    #[test]
    fn test_pose_mode_scores_matching_frames() {
        let script = format!("while true; do echo '{}'; sleep 0.02; done", EVERY_POSE);
        let cfg = producer_config(script, 1.0);
        let source = PoseSource::start(&cfg).expect("producer should start");

        let mut recorder = Recorder::default();
        let report = GameLoop::new(cfg, source, &mut recorder, ManualClock::new()).run();

        // after each match the window restarts, so every frame completes a pose
        assert!(report.frames_received > 0);
        assert_eq!(report.score as u64, 10 * report.frames_received);

        // whenever the score moves the target moves too, never to the same label
        for pair in recorder.frames.windows(2) {
            if pair[1].score > pair[0].score {
                assert_ne!(pair[0].target, pair[1].target);
            }
        }
        assert_eq!(report.final_phase, GamePhase::Terminated);
    }

    #[test]
    fn test_silent_producer_does_not_slow_the_tick_rate() {
        let mut cfg = producer_config("exec sleep 10".to_string(), 1.0);
        cfg.mode = GameMode::Catch;
        cfg.producer.poll_timeout_ms = 100;
        let source = PoseSource::start(&cfg).expect("producer should start");

        let mut recorder = Recorder::default();
        let report = GameLoop::new(cfg, source, &mut recorder, SystemClock::new()).run();

        // 60 Hz for one second; full 100 ms polls would leave about 10 ticks
        assert!(report.ticks >= 45, "ticks: {}", report.ticks);
        assert_eq!(report.frames_received, 0);

        // the only ball spawned on the first tick and falls at 200 px/s of match time
        let last = recorder.frames.last().expect("ticks ran");
        let ball = last.objects.first().expect("a ball is in play");
        let expected = -20.0 + 200.0 * (last.elapsed_secs + 1.0 / 60.0);
        assert!(
            (ball.y - expected).abs() < 5.0,
            "ball at y={} after {}s, expected about {}",
            ball.y,
            last.elapsed_secs,
            expected
        );
    }

    #[test]
    fn test_producer_death_does_not_end_match() {
        let script = format!("echo '{}'; sleep 0.2", EVERY_POSE);
        let cfg = producer_config(script, 2.0);
        let source = PoseSource::start(&cfg).expect("producer should start");

        let mut recorder = Recorder::default();
        let report = GameLoop::new(cfg, source, &mut recorder, ManualClock::new()).run();

        assert!(report.producer_lost);
        assert_eq!(report.final_phase, GamePhase::Terminated);
        assert!(report.duration_secs >= 2.0);
        assert!(!recorder.frames.last().expect("ticks ran").producer_alive);
    }
}

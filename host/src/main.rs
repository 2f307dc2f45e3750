use host::{play_match, FnPointer, GameConfig, LogRenderer};
use pose_core::{GameMode, MatchReport};
use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::time::Instant;

/// Printed when the match ends
#[derive(Serialize)]
struct FinalReport {
    #[serde(flatten)]
    report: MatchReport,
    finished_at: String,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pose-game");

    let mut config_file: Option<String> = None;
    let mut mode: Option<GameMode> = None;
    let mut duration: Option<f32> = None;
    let mut mock = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" | "-m" => {
                let value = flag_value(&args, i, "--mode");
                mode = Some(GameMode::from_str(value).unwrap_or_else(|e| {
                    eprintln!("❌ Error: {}", e);
                    std::process::exit(1);
                }));
                i += 2;
            }
            "--config" | "-c" => {
                config_file = Some(flag_value(&args, i, "--config").to_string());
                i += 2;
            }
            "--duration" | "-d" => {
                let value = flag_value(&args, i, "--duration");
                duration = Some(value.parse().unwrap_or_else(|e| {
                    eprintln!("❌ Error: invalid duration '{}': {}", value, e);
                    std::process::exit(1);
                }));
                i += 2;
            }
            "--mock" => {
                mock = true;
                i += 1;
            }
            "--help" | "-h" => {
                print_usage(program);
                std::process::exit(0);
            }
            other => {
                eprintln!("❌ Unknown argument: {}", other);
                print_usage(program);
                std::process::exit(1);
            }
        }
    }

    let mut config = match &config_file {
        Some(path) => GameConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }),
        None => GameConfig::default(),
    };
    if let Some(mode) = mode {
        config.mode = mode;
    }
    if let Some(duration) = duration {
        config.duration_secs = duration;
    }
    config.mock |= mock;

    // Mock pointer sweeps the hands across the arena
    let (width, height) = (config.arena.width, config.arena.height);
    let origin = Instant::now();
    let pointer = FnPointer(move || {
        let t = origin.elapsed().as_secs_f32();
        Some((width / 2.0 + width * 0.4 * t.sin(), height * 0.75))
    });

    match play_match(config, LogRenderer::new(), pointer) {
        Ok(report) => {
            let summary = FinalReport {
                report,
                finished_at: chrono::Utc::now().to_rfc3339(),
            };
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("❌ Error encoding report: {}", e),
            }
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("❌ Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --mode, -m <pose|catch>   Game to play (default: pose)");
    eprintln!("  --config, -c <file>       JSON config file; missing fields use defaults");
    eprintln!("  --duration, -d <secs>     Match length in seconds (default: 60)");
    eprintln!("  --mock                    Drive the hands from a synthetic pointer instead of the camera");
    eprintln!("  --help, -h                Show this message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to see producer stderr and per-ball events.");
}

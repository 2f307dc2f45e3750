use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Responder};
use host::{play_match, FnPointer, GameConfig, Renderer};
use pose_core::{GameSnapshot, MatchReport};
use serde::{Deserialize, Serialize};

/// State shared between the match thread and the HTTP handlers.
/// The match thread is the only writer of `snapshot` and `report`.
#[derive(Clone, Default)]
struct Shared {
    snapshot: Arc<RwLock<Option<GameSnapshot>>>,
    report: Arc<RwLock<Option<MatchReport>>>,
    quit: Arc<AtomicBool>,
    pointer: Arc<Mutex<Option<(f32, f32)>>>,
}

/// Renderer that publishes each tick for HTTP clients to draw
struct SharedRenderer {
    shared: Shared,
}

impl Renderer for SharedRenderer {
    fn present(&mut self, snapshot: &GameSnapshot) {
        match self.shared.snapshot.write() {
            Ok(mut slot) => *slot = Some(snapshot.clone()),
            Err(_) => tracing::error!("Snapshot lock poisoned"),
        }
    }

    fn quit_requested(&mut self) -> bool {
        self.shared.quit.load(Ordering::SeqCst)
    }
}

// Request/Response types

#[derive(Debug, Deserialize)]
struct PointerRequest {
    x: f32,
    y: f32,
}

#[derive(Debug, Serialize)]
struct AckResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// API Handlers

/// GET /api/state
/// Latest tick snapshot
async fn state(shared: web::Data<Shared>) -> impl Responder {
    let snapshot = shared.snapshot.read().ok().and_then(|slot| slot.clone());
    match snapshot {
        Some(snapshot) => HttpResponse::Ok().json(snapshot),
        None => HttpResponse::ServiceUnavailable().json(AckResponse {
            success: false,
            error: Some("match has not started yet".to_string()),
        }),
    }
}

/// GET /api/report
/// Final match summary once the match is over
async fn report(shared: web::Data<Shared>) -> impl Responder {
    let report = shared.report.read().ok().and_then(|slot| slot.clone());
    match report {
        Some(report) => HttpResponse::Ok().json(report),
        None => HttpResponse::NotFound().json(AckResponse {
            success: false,
            error: Some("match still in progress".to_string()),
        }),
    }
}

/// POST /api/quit
/// End the match early
async fn quit(shared: web::Data<Shared>) -> impl Responder {
    tracing::info!("Received quit request");
    shared.quit.store(true, Ordering::SeqCst);
    HttpResponse::Ok().json(AckResponse {
        success: true,
        error: None,
    })
}

/// POST /api/pointer
/// Move the synthetic hands (mock mode only)
async fn pointer(shared: web::Data<Shared>, req: web::Json<PointerRequest>) -> impl Responder {
    match shared.pointer.lock() {
        Ok(mut slot) => {
            *slot = Some((req.x, req.y));
            HttpResponse::Ok().json(AckResponse {
                success: true,
                error: None,
            })
        }
        Err(_) => HttpResponse::InternalServerError().json(AckResponse {
            success: false,
            error: Some("pointer lock poisoned".to_string()),
        }),
    }
}

/// GET /health
/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "pose-game-api"
    }))
}

fn load_config() -> GameConfig {
    match std::env::var("POSE_GAME_CONFIG") {
        Ok(path) => GameConfig::from_file(&path).unwrap_or_else(|e| {
            tracing::error!("{}", e);
            std::process::exit(1);
        }),
        Err(_) => GameConfig::default(),
    }
}

/// The background match; must be stopped so the producer is released
struct MatchThread {
    quit: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl MatchThread {
    /// Ask the match to end and wait until it has shut its source down
    fn stop(self) {
        self.quit.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            tracing::error!("Match thread panicked");
        }
    }
}

fn spawn_match(config: GameConfig, shared: Shared) -> MatchThread {
    let renderer = SharedRenderer {
        shared: shared.clone(),
    };
    let pointer_slot = Arc::clone(&shared.pointer);
    let pointer = FnPointer(move || pointer_slot.lock().ok().and_then(|p| *p));
    let quit = Arc::clone(&shared.quit);

    let handle = thread::spawn(move || match play_match(config, renderer, pointer) {
        Ok(report) => {
            tracing::info!("Match over: score {}", report.score);
            if let Ok(mut slot) = shared.report.write() {
                *slot = Some(report);
            }
        }
        Err(e) => tracing::error!("Match failed to start: {}", e),
    });

    MatchThread { quit, handle }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Pose Game API Server");

    let shared = Shared::default();
    let match_thread = spawn_match(load_config(), shared.clone());

    let bind_address =
        std::env::var("POSE_GAME_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    tracing::info!("Binding to {}", bind_address);

    let data = web::Data::new(shared);
    let server = HttpServer::new(move || {
        // Configure CORS to allow all origins
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .max_age(86400);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(data.clone())
            .route("/health", web::get().to(health))
            .route("/api/state", web::get().to(state))
            .route("/api/report", web::get().to(report))
            .route("/api/quit", web::post().to(quit))
            .route("/api/pointer", web::post().to(pointer))
    })
    .bind(bind_address);

    let result = match server {
        Ok(server) => server.run().await,
        Err(e) => Err(e),
    };

    tracing::info!("Server stopped, ending match");
    match_thread.stop();
    result
}

/// qr-healer HTTP server
///
/// Exposes the scan flow (direct decode, then model healing) as a small JSON
/// API, served by a synchronous tiny_http server.
///
/// Run with:
///   cargo run --bin qr-healer-server --release -- [config.json]
///
/// Routes:
///   GET  /api/health   — liveness plus whether the model loaded
///   POST /api/scan-qr  — JSON `{ "image": "<base64>" }` or a multipart upload

mod state;
mod routes;
mod handlers;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tiny_http::Server;

use qr_healer::codec::DecodeAdapter;
use qr_healer::heal::{HealingService, Scanner};
use qr_healer::HealerConfig;

use state::AppState;

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match HealerConfig::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let healer = HealingService::load(&config.model_path, config.image_size);
    if !healer.is_ready() {
        log::warn!("serving without a model; damaged codes will not be healed");
    }
    let shared_state = Arc::new(AppState {
        scanner: Scanner::new(healer, DecodeAdapter::platform_default()),
    });

    let server = match Server::http(&config.bind_addr) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to bind {}: {}", config.bind_addr, e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("listening on http://{}", config.bind_addr);

    // Each request is dispatched on its own thread; healing a large upload
    // must not stall health checks.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    ExitCode::SUCCESS
}

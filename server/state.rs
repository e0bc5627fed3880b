use std::sync::Arc;

use qr_healer::heal::Scanner;

/// Everything a request handler needs. Immutable after start-up, so no lock.
pub struct AppState {
    pub scanner: Scanner,
}

/// Shared state type — an `Arc<AppState>` passed to every handler.
pub type SharedState = Arc<AppState>;

//! API Routes
//!
//! Configures the Axum router with all calendar service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    calendar_handler, export_handler, games_handler, health_handler, league_options_handler,
    preview_handler, stats_handler, team_options_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Local cache statistics
/// - `GET /api/games` - Selectable games
/// - `GET /api/league-options/:game_id` - Leagues of a game
/// - `GET /api/team-options/:game_id` - Teams of a game
/// - `POST /preview` - Preview matches for a selection
/// - `POST /export` - Persist a selection, returning its calendar URL
/// - `GET /:file` - Calendar feed for `<hash>.ics`
///
/// Static paths take precedence over the `/:file` catch-all.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/api/games", get(games_handler))
        .route("/api/league-options/:game_id", get(league_options_handler))
        .route("/api/team-options/:game_id", get(team_options_handler))
        .route("/preview", post(preview_handler))
        .route("/export", post(export_handler))
        .route("/:file", get(calendar_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

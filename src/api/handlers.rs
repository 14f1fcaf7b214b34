//! API Handlers
//!
//! HTTP request handlers for each calendar service endpoint.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::{Cache, CacheKey, LocalCache, TieredCache};
use crate::calendar;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::mapping;
use crate::models::{
    ExportResponse, GameIdPath, GameOption, HealthResponse, LeagueOption, LeagueOptionsResponse,
    PreviewMatch, PreviewResponse, StatsResponse, TeamOption, TeamOptionsResponse,
};
use crate::resolver::MatchResolver;
use crate::selection::SelectionRequest;
use crate::source::{MatchSource, UrlMappingStore};

/// Browser cache lifetime of the games list, in seconds.
pub const GAMES_MAX_AGE: u32 = 300;
/// Browser cache lifetime of option lists, in seconds.
pub const OPTIONS_MAX_AGE: u32 = 600;

/// Response header telling whether the body came from the cache.
pub const X_CACHE: &str = "x-cache";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn MatchSource>,
    pub mappings: Arc<dyn UrlMappingStore>,
    /// Local LRU in front of the shared cache, for option lists and games
    pub options_cache: Arc<TieredCache>,
    /// Shared cache only, for rendered calendars
    pub calendar_cache: Arc<dyn Cache>,
    pub resolver: MatchResolver,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the handlers to a data source and a shared cache backend.
    pub fn new(
        source: Arc<dyn MatchSource>,
        mappings: Arc<dyn UrlMappingStore>,
        shared: Arc<dyn Cache>,
        config: Config,
    ) -> Self {
        let local = Arc::new(LocalCache::new(config.local_cache_capacity));
        Self {
            resolver: MatchResolver::new(source.clone(), config.preview_limit),
            options_cache: Arc::new(TieredCache::new(local, shared.clone())),
            calendar_cache: shared,
            source,
            mappings,
            config: Arc::new(config),
        }
    }

    pub fn local_cache(&self) -> &Arc<LocalCache> {
        self.options_cache.local()
    }
}

// == Helpers ==
fn cache_status(hit: bool) -> &'static str {
    if hit {
        "HIT"
    } else {
        "MISS"
    }
}

/// Pre-serialized JSON with the HTTP cache headers.
fn cached_json(body: Vec<u8>, hit: bool, max_age: u32) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CACHE_CONTROL, format!("public, max-age={}", max_age)),
            (HeaderName::from_static(X_CACHE), cache_status(hit).to_string()),
        ],
        body,
    )
        .into_response()
}

/// Returns the cached bytes under `key`, or runs `load` and caches its output.
///
/// The boolean is true on a cache hit. Cache failures never fail the request:
/// a read error is a miss and a write error is only logged.
async fn read_through<F, Fut>(
    cache: &dyn Cache,
    key: &CacheKey,
    ttl: Duration,
    load: F,
) -> Result<(Vec<u8>, bool)>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<u8>>>,
{
    let cache_key = key.to_string();
    match cache.get(&cache_key).await {
        Ok(Some(bytes)) => {
            info!(cache_key = %cache_key, size = bytes.len(), "Cache HIT");
            return Ok((bytes, true));
        }
        Ok(None) => info!(cache_key = %cache_key, "Cache MISS"),
        Err(err) => warn!(cache_key = %cache_key, error = %err, "Cache read failed, treating as miss"),
    }

    let bytes = load().await?;
    if let Err(err) = cache.set(&cache_key, &bytes, Some(ttl)).await {
        warn!(cache_key = %cache_key, error = %err, "Failed to cache response");
    } else {
        debug!(cache_key = %cache_key, size = bytes.len(), "Data cached");
    }
    Ok((bytes, false))
}

/// Option-list error in the list's own shape, so the page can render it.
fn options_error<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

fn log_source_error(handler: &str, err: &AppError) {
    error!(handler, error = %err, "Data source query failed");
}

// == Service ==
/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Local LRU counters plus the active shared backend.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.local_cache().stats().await;
    Json(StatsResponse::new(&stats, state.calendar_cache.name()))
}

// == Option Lists ==
/// Handler for GET /api/games
pub async fn games_handler(State(state): State<AppState>) -> Result<Response> {
    let source = state.source.clone();
    let (body, hit) = read_through(
        state.options_cache.as_ref(),
        &CacheKey::AllGames,
        state.config.data_ttl(),
        || async move {
            let games = source.all_games().await?;
            let options: Vec<GameOption> = games.iter().map(GameOption::from).collect();
            Ok(serde_json::to_vec(&options)?)
        },
    )
    .await
    .map_err(|err| {
        log_source_error("games", &err);
        err
    })?;

    Ok(cached_json(body, hit, GAMES_MAX_AGE))
}

/// Handler for GET /api/league-options/:game_id
pub async fn league_options_handler(
    State(state): State<AppState>,
    Path(path): Path<GameIdPath>,
) -> Response {
    let Some(game_id) = path.parse() else {
        warn!(handler = "league_options", raw = %path.game_id, "Invalid game ID");
        return options_error(
            StatusCode::BAD_REQUEST,
            LeagueOptionsResponse::failed("Invalid game ID"),
        );
    };

    let source = state.source.clone();
    let result = read_through(
        state.options_cache.as_ref(),
        &CacheKey::LeagueOptions(game_id),
        state.config.data_ttl(),
        || async move {
            let leagues = source.leagues_by_game(game_id).await?;
            let options = leagues.iter().map(LeagueOption::from).collect();
            debug!(game_id, count = leagues.len(), "Loaded league options");
            Ok(serde_json::to_vec(&LeagueOptionsResponse::new(options))?)
        },
    )
    .await;

    match result {
        Ok((body, hit)) => cached_json(body, hit, OPTIONS_MAX_AGE),
        Err(err) => {
            log_source_error("league_options", &err);
            options_error(err.status(), LeagueOptionsResponse::failed(err.public_message()))
        }
    }
}

/// Handler for GET /api/team-options/:game_id
pub async fn team_options_handler(
    State(state): State<AppState>,
    Path(path): Path<GameIdPath>,
) -> Response {
    let Some(game_id) = path.parse() else {
        warn!(handler = "team_options", raw = %path.game_id, "Invalid game ID");
        return options_error(
            StatusCode::BAD_REQUEST,
            TeamOptionsResponse::failed("Invalid game ID"),
        );
    };

    let source = state.source.clone();
    let result = read_through(
        state.options_cache.as_ref(),
        &CacheKey::TeamOptions(game_id),
        state.config.data_ttl(),
        || async move {
            let teams = source.teams_by_game(game_id).await?;
            let options = teams.iter().map(TeamOption::from).collect();
            debug!(game_id, count = teams.len(), "Loaded team options");
            Ok(serde_json::to_vec(&TeamOptionsResponse::new(options))?)
        },
    )
    .await;

    match result {
        Ok((body, hit)) => cached_json(body, hit, OPTIONS_MAX_AGE),
        Err(err) => {
            log_source_error("team_options", &err);
            options_error(err.status(), TeamOptionsResponse::failed(err.public_message()))
        }
    }
}

// == Preview ==
/// Handler for POST /preview
///
/// An empty body is an empty selection.
pub async fn preview_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PreviewResponse>> {
    let request = if body.is_empty() {
        SelectionRequest::default()
    } else {
        SelectionRequest::from_slice(&body)?
    };
    let filter = request.filter();
    debug!(
        games = filter.game_ids.len(),
        leagues = filter.league_ids.len(),
        teams = filter.team_ids.len(),
        max_tier = filter.max_tier,
        "Parsed preview selection"
    );

    let resolution = state
        .resolver
        .resolve(&filter, Utc::now())
        .await
        .map_err(|err| {
            log_source_error("preview", &err);
            err
        })?;

    let matches = resolution
        .matches
        .iter()
        .map(|m| PreviewMatch::from_match(m, request.hide_scores))
        .collect();

    Ok(Json(PreviewResponse {
        matches,
        using_past_fallback: resolution.using_past_fallback,
        hide_scores: request.hide_scores,
    }))
}

// == Export ==
/// Handler for POST /export
///
/// Stores the canonical body under its content hash and returns the
/// calendar URL. Exporting the same selection twice yields the same hash.
pub async fn export_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ExportResponse>> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::InvalidRequest("Invalid request body".to_string()))?;
    // reject anything that is not a selection body before persisting it
    SelectionRequest::from_value(&body)?;

    let (hash, payload) = mapping::hash_body(&body)?;
    state
        .mappings
        .create_if_absent(&hash, &payload)
        .await
        .map_err(|err| {
            error!(hash = %hash, error = %err, "Failed to store URL mapping");
            err
        })?;

    info!(hash = %hash, "Calendar exported");
    Ok(Json(ExportResponse::new(&state.config.public_base_url, hash)))
}

// == Calendar ==
/// Handler for GET /:file, where file is `<hash>.ics`
pub async fn calendar_handler(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response> {
    let hash = mapping::parse_calendar_file(&file)
        .ok_or_else(|| AppError::NotFound("Calendar not found".to_string()))?
        .to_string();

    let loader_state = state.clone();
    let loader_hash = hash.clone();
    let (body, hit) = read_through(
        state.calendar_cache.as_ref(),
        &CacheKey::Calendar(hash.clone()),
        state.config.ics_ttl(),
        || async move { render_calendar(&loader_state, &loader_hash).await.map(String::into_bytes) },
    )
    .await?;

    // best effort; the calendar is served either way
    if let Err(err) = state.mappings.record_access(&hash).await {
        warn!(hash = %hash, error = %err, "Failed to update access count");
    }

    debug!(hash = %hash, size = body.len(), "Served calendar");
    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"esports-calendar-{}.ics\"", hash),
            ),
            (HeaderName::from_static(X_CACHE), cache_status(hit).to_string()),
        ],
        body,
    )
        .into_response())
}

/// Looks up the stored selection for `hash` and renders its calendar.
async fn render_calendar(state: &AppState, hash: &str) -> Result<String> {
    let mapping = state.mappings.lookup(hash).await?;
    let request = SelectionRequest::from_slice(mapping.value_list.as_bytes()).map_err(|err| {
        error!(hash = %hash, error = %err, "Failed to parse stored selection");
        AppError::Internal("Invalid calendar data".to_string())
    })?;

    let filter = request.filter();
    let matches = if filter.is_empty() {
        Vec::new()
    } else {
        let since = Utc::now() - chrono::Duration::days(state.config.calendar_lookback_days);
        state
            .source
            .calendar_matches(&filter, since)
            .await
            .map_err(|err| {
                log_source_error("calendar", &err);
                err
            })?
    };

    debug!(hash = %hash, match_count = matches.len(), "Rendering calendar");
    Ok(calendar::render(&matches, request.hide_scores))
}

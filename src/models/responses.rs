//! Response DTOs for the calendar API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::error::AppError;
use crate::source::{Game, League, Match, Team};

/// Image served when a game, league or team has none.
pub const DEFAULT_IMAGE: &str = "/static/images/default-logo.png";

fn image_or_default(image: Option<&str>) -> String {
    match image {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => DEFAULT_IMAGE.to_string(),
    }
}

// == Option Lists ==
/// Entry of the games list (GET /api/games)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameOption {
    pub id: i32,
    pub name: String,
    pub logo: String,
}

impl From<&Game> for GameOption {
    fn from(game: &Game) -> Self {
        let logo = match game.slug.as_deref() {
            Some(slug) if !slug.is_empty() => format!("/static/images/{}.png", slug),
            _ => DEFAULT_IMAGE.to_string(),
        };
        Self {
            id: game.id,
            name: game.name.clone(),
            logo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueOption {
    pub id: i32,
    pub name: String,
    pub image: String,
    /// True when at least one of the league's tournaments is tier 1
    pub is_tier1: bool,
}

impl From<&League> for LeagueOption {
    fn from(league: &League) -> Self {
        Self {
            id: league.id,
            name: league.name.clone(),
            image: image_or_default(league.image_link.as_deref()),
            is_tier1: league.min_tier == Some(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOption {
    pub id: i32,
    pub name: String,
    pub acronym: String,
    pub image: String,
}

impl From<&Team> for TeamOption {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            acronym: team.acronym.clone().unwrap_or_default(),
            image: image_or_default(team.image_link.as_deref()),
        }
    }
}

/// Response body for GET /api/league-options/:game_id
#[derive(Debug, Clone, Serialize)]
pub struct LeagueOptionsResponse {
    pub error: bool,
    pub message: String,
    pub leagues: Vec<LeagueOption>,
}

impl LeagueOptionsResponse {
    pub fn new(leagues: Vec<LeagueOption>) -> Self {
        Self {
            error: false,
            message: String::new(),
            leagues,
        }
    }

    /// Error body; the list is always present and empty.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            leagues: Vec::new(),
        }
    }
}

/// Response body for GET /api/team-options/:game_id
#[derive(Debug, Clone, Serialize)]
pub struct TeamOptionsResponse {
    pub error: bool,
    pub message: String,
    pub teams: Vec<TeamOption>,
}

impl TeamOptionsResponse {
    pub fn new(teams: Vec<TeamOption>) -> Self {
        Self {
            error: false,
            message: String::new(),
            teams,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            teams: Vec::new(),
        }
    }
}

// == Preview ==
/// One match in a preview list.
///
/// Scores are left out entirely when the user asked to hide them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewMatch {
    pub id: i32,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub finished: bool,
    pub game_name: String,
    pub league_name: String,
    pub tournament_name: String,
    pub series_name: String,
    pub team1_name: String,
    pub team2_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team1_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team2_score: Option<i32>,
    pub team1_image: String,
    pub team2_image: String,
    pub league_image: String,
}

impl PreviewMatch {
    pub fn from_match(m: &Match, hide_scores: bool) -> Self {
        let (team1_score, team2_score) = if hide_scores {
            (None, None)
        } else {
            (Some(m.team1_score), Some(m.team2_score))
        };
        Self {
            id: m.id,
            name: m.name.clone(),
            start_time: m.expected_start_time,
            finished: m.finished,
            game_name: m.game_name.clone(),
            league_name: m.league_name.clone(),
            tournament_name: m.tournament_name.clone(),
            series_name: m.series_name.clone(),
            team1_name: m.team1_name.clone(),
            team2_name: m.team2_name.clone(),
            team1_score,
            team2_score,
            team1_image: image_or_default(m.team1_image.as_deref()),
            team2_image: image_or_default(m.team2_image.as_deref()),
            league_image: image_or_default(m.league_image.as_deref()),
        }
    }
}

/// Response body for POST /preview
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub matches: Vec<PreviewMatch>,
    /// Set when only past matches could be found
    pub using_past_fallback: bool,
    pub hide_scores: bool,
}

// == Export ==
/// Response body for POST /export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResponse {
    /// 16 hex chars naming the calendar
    pub hash: String,
    /// Subscribable calendar URL
    pub url: String,
}

impl ExportResponse {
    pub fn new(base_url: &str, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        Self {
            url: format!("{}/{}.ics", base_url.trim_end_matches('/'), hash),
            hash,
        }
    }
}

// == Service ==
/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of local cache hits
    pub hits: u64,
    /// Number of local cache misses
    pub misses: u64,
    /// Number of local evictions
    pub evictions: u64,
    /// Current number of entries in the local cache
    pub total_entries: usize,
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Name of the shared cache backend in use
    pub shared_backend: String,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, shared_backend: impl Into<String>) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            capacity: stats.capacity,
            hit_rate: stats.hit_rate(),
            shared_backend: shared_backend.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self::new(err.public_message())
    }
}

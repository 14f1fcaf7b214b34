//! Data Source Module
//!
//! Typed query surface over the relational store. The core only sees these
//! traits; [`PgSource`] runs them against PostgreSQL and [`MemorySource`]
//! keeps everything in memory for tests and local runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::selection::CanonicalFilter;

pub use memory::MemorySource;
pub use postgres::PgSource;

// == Rows ==
/// A match joined with its display fields. Read-only projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: i32,
    pub name: String,
    /// Matches without a scheduled start are never rendered into a calendar
    pub expected_start_time: Option<DateTime<Utc>>,
    pub finished: bool,
    pub game_id: i32,
    pub league_id: i32,
    /// Tier of the tournament the match belongs to
    pub tier: i32,
    pub team1_id: Option<i32>,
    pub team1_score: i32,
    pub team2_id: Option<i32>,
    pub team2_score: i32,
    pub amount_of_games: i32,
    pub game_name: String,
    pub league_name: String,
    pub series_name: String,
    pub tournament_name: String,
    pub team1_name: String,
    pub team2_name: String,
    pub team1_image: Option<String>,
    pub team2_image: Option<String>,
    pub league_image: Option<String>,
}

impl Match {
    /// Whether `filter` selects this match (ignoring time).
    pub fn matches_filter(&self, filter: &CanonicalFilter) -> bool {
        filter.accepts(
            self.game_id,
            self.league_id,
            [self.team1_id, self.team2_id],
            self.tier,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Game {
    pub id: i32,
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct League {
    pub id: i32,
    pub game_id: i32,
    pub name: String,
    pub image_link: Option<String>,
    /// Most prestigious tier any of the league's tournaments reaches
    pub min_tier: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: i32,
    pub game_id: i32,
    pub name: String,
    pub acronym: Option<String>,
    pub image_link: Option<String>,
}

/// Export hash → stored request body, with access statistics.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UrlMapping {
    pub hashed_key: String,
    /// Canonical JSON of the original export request body
    pub value_list: String,
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    pub accessed_at: Option<DateTime<Utc>>,
}

// == Query Traits ==
#[async_trait]
pub trait MatchSource: Send + Sync {
    async fn all_games(&self) -> Result<Vec<Game>>;

    async fn leagues_by_game(&self, game_id: i32) -> Result<Vec<League>>;

    async fn teams_by_game(&self, game_id: i32) -> Result<Vec<Team>>;

    /// Up to `limit` matches starting at or after `now`, ascending by start.
    async fn future_matches(
        &self,
        filter: &CanonicalFilter,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Match>>;

    /// Up to `limit` matches starting before `now`, descending by start
    /// (closest to `now` first).
    async fn past_matches(
        &self,
        filter: &CanonicalFilter,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Match>>;

    /// Every match starting at or after `since`, ascending by start.
    async fn calendar_matches(
        &self,
        filter: &CanonicalFilter,
        since: DateTime<Utc>,
    ) -> Result<Vec<Match>>;
}

#[async_trait]
pub trait UrlMappingStore: Send + Sync {
    /// Inserts the mapping unless the hash already exists. Never overwrites.
    async fn create_if_absent(&self, hash: &str, payload: &str) -> Result<()>;

    /// Fails with `AppError::NotFound` for an unknown hash.
    async fn lookup(&self, hash: &str) -> Result<UrlMapping>;

    /// Increments the access counter and stamps `accessed_at`.
    async fn record_access(&self, hash: &str) -> Result<()>;
}

//! PostgreSQL data source
//!
//! Runtime-checked `sqlx` queries against the esports schema. Id lists are
//! bound as `int4[]` and matched with `= ANY(...)`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, Result};
use crate::selection::CanonicalFilter;
use crate::source::{Game, League, Match, MatchSource, Team, UrlMapping, UrlMappingStore};

/// Projection shared by every match query.
const MATCH_SELECT: &str = "\
    SELECT m.id, m.name, m.expected_start_time, m.finished, \
           m.game_id, m.league_id, tr.tier, \
           m.team1_id, m.team1_score, m.team2_id, m.team2_score, m.amount_of_games, \
           g.name AS game_name, \
           l.name AS league_name, \
           COALESCE(s.name, '') AS series_name, \
           COALESCE(tr.name, '') AS tournament_name, \
           COALESCE(t1.name, '') AS team1_name, \
           COALESCE(t2.name, '') AS team2_name, \
           t1.image_link AS team1_image, \
           t2.image_link AS team2_image, \
           l.image_link AS league_image \
    FROM matches m \
    JOIN games g ON g.id = m.game_id \
    JOIN leagues l ON l.id = m.league_id \
    JOIN tournaments tr ON tr.id = m.tournament_id \
    LEFT JOIN series s ON s.id = m.series_id \
    LEFT JOIN teams t1 ON t1.id = m.team1_id \
    LEFT JOIN teams t2 ON t2.id = m.team2_id";

/// Selection predicate; binds $1 games, $2 leagues, $3 teams, $4 max tier.
/// Empty league and team lists select whole games up to the tier ceiling.
const MATCH_FILTER: &str = "\
    m.game_id = ANY($1) \
    AND (m.team1_id = ANY($3) \
         OR m.team2_id = ANY($3) \
         OR (m.league_id = ANY($2) AND tr.tier <= $4) \
         OR (cardinality($2::int4[]) = 0 AND cardinality($3::int4[]) = 0 AND tr.tier <= $4))";

const MAPPING_COLUMNS: &str = "\
    hashed_key, value_list::text AS value_list, access_count, created_at, accessed_at";

pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }

    async fn filtered(
        &self,
        time_clause: &str,
        order: &str,
        filter: &CanonicalFilter,
        at: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Match>> {
        let limit_clause = if limit.is_some() { " LIMIT $6" } else { "" };
        let query = format!(
            "{MATCH_SELECT} WHERE {MATCH_FILTER} AND {time_clause} \
             ORDER BY m.expected_start_time {order}, m.id{limit_clause}"
        );

        let mut q = sqlx::query_as::<_, Match>(&query)
            .bind(&filter.game_ids)
            .bind(&filter.league_ids)
            .bind(&filter.team_ids)
            .bind(filter.max_tier)
            .bind(at);
        if let Some(limit) = limit {
            q = q.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        Ok(q.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl MatchSource for PgSource {
    async fn all_games(&self) -> Result<Vec<Game>> {
        let games = sqlx::query_as::<_, Game>("SELECT id, name, slug FROM games ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(games)
    }

    async fn leagues_by_game(&self, game_id: i32) -> Result<Vec<League>> {
        let leagues = sqlx::query_as::<_, League>(
            "SELECT l.id, l.game_id, l.name, l.image_link, MIN(tr.tier) AS min_tier \
             FROM leagues l \
             LEFT JOIN tournaments tr ON tr.league_id = l.id \
             WHERE l.game_id = $1 \
             GROUP BY l.id, l.game_id, l.name, l.image_link \
             ORDER BY MIN(tr.tier) NULLS LAST, l.name",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(leagues)
    }

    async fn teams_by_game(&self, game_id: i32) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            "SELECT id, game_id, name, acronym, image_link \
             FROM teams WHERE game_id = $1 ORDER BY name",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    async fn future_matches(
        &self,
        filter: &CanonicalFilter,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Match>> {
        self.filtered("m.expected_start_time >= $5", "ASC", filter, now, Some(limit))
            .await
    }

    async fn past_matches(
        &self,
        filter: &CanonicalFilter,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Match>> {
        self.filtered("m.expected_start_time < $5", "DESC", filter, now, Some(limit))
            .await
    }

    async fn calendar_matches(
        &self,
        filter: &CanonicalFilter,
        since: DateTime<Utc>,
    ) -> Result<Vec<Match>> {
        self.filtered("m.expected_start_time >= $5", "ASC", filter, since, None)
            .await
    }
}

#[async_trait]
impl UrlMappingStore for PgSource {
    async fn create_if_absent(&self, hash: &str, payload: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO url_mappings (hashed_key, value_list) VALUES ($1, $2::jsonb) \
             ON CONFLICT (hashed_key) DO NOTHING",
        )
        .bind(hash)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn lookup(&self, hash: &str) -> Result<UrlMapping> {
        let query = format!("SELECT {MAPPING_COLUMNS} FROM url_mappings WHERE hashed_key = $1");
        sqlx::query_as::<_, UrlMapping>(&query)
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Calendar not found".to_string()))
    }

    async fn record_access(&self, hash: &str) -> Result<()> {
        sqlx::query(
            "UPDATE url_mappings \
             SET access_count = access_count + 1, accessed_at = NOW() \
             WHERE hashed_key = $1",
        )
        .bind(hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

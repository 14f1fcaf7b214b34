//! In-memory data source
//!
//! Same query semantics as the PostgreSQL source over plain vectors. Counts
//! match queries so callers can assert that nothing was queried.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::selection::CanonicalFilter;
use crate::source::{Game, League, Match, MatchSource, Team, UrlMapping, UrlMappingStore};

#[derive(Debug, Default)]
pub struct MemorySource {
    games: RwLock<Vec<Game>>,
    leagues: RwLock<Vec<League>>,
    teams: RwLock<Vec<Team>>,
    matches: RwLock<Vec<Match>>,
    mappings: RwLock<HashMap<String, UrlMapping>>,
    match_queries: AtomicUsize,
    /// When set, every query fails with this error message
    failure: RwLock<Option<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_game(&self, game: Game) {
        self.games.write().await.push(game);
    }

    pub async fn add_league(&self, league: League) {
        self.leagues.write().await.push(league);
    }

    pub async fn add_team(&self, team: Team) {
        self.teams.write().await.push(team);
    }

    pub async fn add_match(&self, m: Match) {
        self.matches.write().await.push(m);
    }

    /// Number of match queries issued so far.
    pub fn match_queries(&self) -> usize {
        self.match_queries.load(Ordering::SeqCst)
    }

    /// Number of stored URL mappings.
    pub async fn mapping_count(&self) -> usize {
        self.mappings.read().await.len()
    }

    /// Makes every subsequent query fail as a connection-class error.
    pub async fn fail_queries(&self, message: &str) {
        *self.failure.write().await = Some(message.to_string());
    }

    async fn check(&self) -> Result<()> {
        match self.failure.read().await.as_ref() {
            Some(message) => Err(AppError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    /// Filtered matches with a known start satisfying `keep`, ascending by start.
    /// The sort is stable so ties keep insertion order.
    async fn select(
        &self,
        filter: &CanonicalFilter,
        keep: impl Fn(DateTime<Utc>) -> bool,
    ) -> Result<Vec<Match>> {
        self.check().await?;
        self.match_queries.fetch_add(1, Ordering::SeqCst);

        let mut selected: Vec<Match> = self
            .matches
            .read()
            .await
            .iter()
            .filter(|m| m.matches_filter(filter))
            .filter(|m| m.expected_start_time.is_some_and(&keep))
            .cloned()
            .collect();
        selected.sort_by_key(|m| m.expected_start_time);
        Ok(selected)
    }
}

#[async_trait]
impl MatchSource for MemorySource {
    async fn all_games(&self) -> Result<Vec<Game>> {
        self.check().await?;
        let mut games = self.games.read().await.clone();
        games.sort_by_key(|g| g.id);
        Ok(games)
    }

    async fn leagues_by_game(&self, game_id: i32) -> Result<Vec<League>> {
        self.check().await?;
        let mut leagues: Vec<League> = self
            .leagues
            .read()
            .await
            .iter()
            .filter(|l| l.game_id == game_id)
            .cloned()
            .collect();
        leagues.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(leagues)
    }

    async fn teams_by_game(&self, game_id: i32) -> Result<Vec<Team>> {
        self.check().await?;
        let mut teams: Vec<Team> = self
            .teams
            .read()
            .await
            .iter()
            .filter(|t| t.game_id == game_id)
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn future_matches(
        &self,
        filter: &CanonicalFilter,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Match>> {
        let mut matches = self.select(filter, |start| start >= now).await?;
        matches.truncate(limit);
        Ok(matches)
    }

    async fn past_matches(
        &self,
        filter: &CanonicalFilter,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Match>> {
        let mut matches = self.select(filter, |start| start < now).await?;
        matches.reverse();
        matches.truncate(limit);
        Ok(matches)
    }

    async fn calendar_matches(
        &self,
        filter: &CanonicalFilter,
        since: DateTime<Utc>,
    ) -> Result<Vec<Match>> {
        self.select(filter, |start| start >= since).await
    }
}

#[async_trait]
impl UrlMappingStore for MemorySource {
    async fn create_if_absent(&self, hash: &str, payload: &str) -> Result<()> {
        self.check().await?;
        self.mappings
            .write()
            .await
            .entry(hash.to_string())
            .or_insert_with(|| UrlMapping {
                hashed_key: hash.to_string(),
                value_list: payload.to_string(),
                access_count: 0,
                created_at: Utc::now(),
                accessed_at: None,
            });
        Ok(())
    }

    async fn lookup(&self, hash: &str) -> Result<UrlMapping> {
        self.check().await?;
        self.mappings
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Calendar not found".to_string()))
    }

    async fn record_access(&self, hash: &str) -> Result<()> {
        self.check().await?;
        let mut mappings = self.mappings.write().await;
        let mapping = mappings
            .get_mut(hash)
            .ok_or_else(|| AppError::NotFound("Calendar not found".to_string()))?;
        mapping.access_count += 1;
        mapping.accessed_at = Some(Utc::now());
        Ok(())
    }
}

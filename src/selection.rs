//! Selection Codec
//!
//! Turns the loosely-typed selection payload posted by the browser into a
//! strict [`CanonicalFilter`]. Bad entries are dropped here, at the boundary,
//! with a warning; nothing downstream sees untyped JSON.
//!
//! Two body shapes are accepted:
//! - wrapped: `{"selections": {"<gameId>": {...}}, "hideScores": bool}`, picked
//!   whenever `selections` is an object
//! - bare: `{"<gameId>": {"leagues": [..], "teams": [..], "maxTier": n}}`

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Ceiling used when no game specifies one: only the most prestigious tier.
pub const DEFAULT_MAX_TIER: i32 = 1;

const HIDE_SCORES_KEY: &str = "hideScores";
const SELECTIONS_KEY: &str = "selections";

// == Selection ==
/// Per-game choice: explicit leagues, explicit teams and an optional tier ceiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSelection {
    pub leagues: BTreeSet<i32>,
    pub teams: BTreeSet<i32>,
    pub max_tier: Option<i32>,
}

/// Game id → what the user picked for that game.
pub type Selection = BTreeMap<i32, GameSelection>;

/// A parsed request body with the shape difference resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    pub selection: Selection,
    pub hide_scores: bool,
}

impl SelectionRequest {
    /// Parses a request body, accepting both the wrapped and the bare shape.
    ///
    /// Only a body that is not a JSON object is rejected; individual bad
    /// entries are skipped.
    pub fn from_value(body: &Value) -> Result<Self> {
        let Some(body) = body.as_object() else {
            return Err(AppError::InvalidRequest("Invalid request body".to_string()));
        };

        // A malformed flag reads as false; it never changes which shape is used.
        let hide_scores = body
            .get(HIDE_SCORES_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let selections = match body.get(SELECTIONS_KEY).and_then(Value::as_object) {
            Some(wrapped) => wrapped.clone(),
            None => {
                let mut bare = body.clone();
                bare.remove(HIDE_SCORES_KEY);
                bare
            }
        };

        Ok(Self {
            selection: parse_selection(&selections),
            hide_scores,
        })
    }

    /// Parses raw body bytes (a request body or a stored mapping payload).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let body: Value = serde_json::from_slice(bytes)
            .map_err(|_| AppError::InvalidRequest("Invalid request body".to_string()))?;
        Self::from_value(&body)
    }

    pub fn filter(&self) -> CanonicalFilter {
        CanonicalFilter::from_selection(&self.selection)
    }
}

/// Builds a [`Selection`] from the per-game map, skipping what cannot be parsed.
pub fn parse_selection(raw: &Map<String, Value>) -> Selection {
    let mut selection = Selection::new();

    for (game_key, data) in raw {
        let game_id = match game_key.parse::<i32>() {
            Ok(id) => id,
            Err(err) => {
                warn!(game_id_str = %game_key, error = %err, "Invalid game ID");
                continue;
            }
        };

        let mut game = GameSelection::default();
        if let Some(obj) = data.as_object() {
            game.leagues = int_list(obj.get("leagues"), "league", game_id);
            game.teams = int_list(obj.get("teams"), "team", game_id);
            game.max_tier = tier(obj.get("maxTier"), game_id);
        }
        selection.insert(game_id, game);
    }

    selection
}

fn int_list(value: Option<&Value>, kind: &str, game_id: i32) -> BTreeSet<i32> {
    let Some(items) = value.and_then(Value::as_array) else {
        return BTreeSet::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = item.as_i64().and_then(|n| i32::try_from(n).ok());
            if id.is_none() {
                debug!(game_id, kind, value = %item, "Skipping non-integer id");
            }
            id
        })
        .collect()
}

fn tier(value: Option<&Value>, game_id: i32) -> Option<i32> {
    let value = value?;
    match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
        Some(t) if t >= 1 => Some(t),
        _ => {
            warn!(game_id, value = %value, "Ignoring invalid tier");
            None
        }
    }
}

// == Canonical Filter ==
/// Flattened, immutable filter handed to the resolver and the data source.
///
/// Id lists are sorted and deduplicated. `max_tier` is the maximum of the
/// per-game ceilings (the most inclusive choice), never below
/// [`DEFAULT_MAX_TIER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalFilter {
    pub game_ids: Vec<i32>,
    pub league_ids: Vec<i32>,
    pub team_ids: Vec<i32>,
    pub max_tier: i32,
}

impl Default for CanonicalFilter {
    fn default() -> Self {
        Self {
            game_ids: Vec::new(),
            league_ids: Vec::new(),
            team_ids: Vec::new(),
            max_tier: DEFAULT_MAX_TIER,
        }
    }
}

impl CanonicalFilter {
    pub fn from_selection(selection: &Selection) -> Self {
        let mut leagues = BTreeSet::new();
        let mut teams = BTreeSet::new();
        let mut max_tier = DEFAULT_MAX_TIER;

        for game in selection.values() {
            leagues.extend(game.leagues.iter().copied());
            teams.extend(game.teams.iter().copied());
            if let Some(t) = game.max_tier {
                max_tier = max_tier.max(t);
            }
        }

        Self {
            game_ids: selection.keys().copied().collect(),
            league_ids: leagues.into_iter().collect(),
            team_ids: teams.into_iter().collect(),
            max_tier,
        }
    }

    /// True when no game was selected; such a filter must not be queried.
    pub fn is_empty(&self) -> bool {
        self.game_ids.is_empty()
    }

    /// True when games were picked without naming any league or team.
    pub fn is_game_wide(&self) -> bool {
        self.league_ids.is_empty() && self.team_ids.is_empty()
    }

    /// The match predicate:
    /// game ∈ games AND (a team ∈ teams OR (league ∈ leagues AND tier ≤ max_tier)).
    ///
    /// A game-wide filter takes every match of its games within the tier ceiling.
    pub fn accepts(&self, game_id: i32, league_id: i32, team_ids: [Option<i32>; 2], tier: i32) -> bool {
        if !self.game_ids.contains(&game_id) {
            return false;
        }
        if self.is_game_wide() {
            return tier <= self.max_tier;
        }
        let team_hit = team_ids
            .iter()
            .flatten()
            .any(|team| self.team_ids.contains(team));
        team_hit || (self.league_ids.contains(&league_id) && tier <= self.max_tier)
    }
}

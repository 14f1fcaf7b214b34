//! Request DTOs for the calendar API
//!
//! Selection bodies are taken as raw JSON and parsed by the selection codec;
//! the only other client input is the game id in option-list paths.

use serde::Deserialize;

/// Path segment of GET /api/{league,team}-options/:game_id
///
/// Kept as a string so a malformed id can be answered with the option-list
/// error shape instead of axum's rejection body.
#[derive(Debug, Clone, Deserialize)]
pub struct GameIdPath {
    pub game_id: String,
}

impl GameIdPath {
    /// Parses the game id as a 32-bit integer.
    pub fn parse(&self) -> Option<i32> {
        self.game_id.trim().parse().ok()
    }
}

//! Request and Response models for the calendar API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::GameIdPath;
pub use responses::{
    ErrorResponse, ExportResponse, GameOption, HealthResponse, LeagueOption,
    LeagueOptionsResponse, PreviewMatch, PreviewResponse, StatsResponse, TeamOption,
    TeamOptionsResponse, DEFAULT_IMAGE,
};

//! API Module
//!
//! HTTP handlers and routing for the calendar service.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats` - Service status
//! - `GET /api/games`, `GET /api/{league,team}-options/:game_id` - Option lists
//! - `POST /preview` - Match preview for a selection
//! - `POST /export` - Shareable calendar link for a selection
//! - `GET /:hash.ics` - Calendar feed

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

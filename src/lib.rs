//! Esports Calendar - personalized match calendars
//!
//! Turns a user's game/league/team selection into a match preview and a
//! subscribable iCalendar feed, with a two-tier cache in front of the
//! relational store.

pub mod api;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod mapping;
pub mod models;
pub mod resolver;
pub mod selection;
pub mod source;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;

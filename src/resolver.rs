//! Match Resolver
//!
//! Produces the bounded, chronologically ordered preview list for a filter:
//! upcoming matches first, backfilled with the most recent past matches when
//! there are not enough of them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::selection::CanonicalFilter;
use crate::source::{Match, MatchSource};

/// Default number of matches in a preview.
pub const DEFAULT_TARGET: usize = 10;

/// Outcome of a resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Ascending by start time: backfilled past matches, then future ones
    pub matches: Vec<Match>,
    /// True iff no future match was found and at least one past match was
    pub using_past_fallback: bool,
}

#[derive(Clone)]
pub struct MatchResolver {
    source: Arc<dyn MatchSource>,
    target: usize,
}

impl MatchResolver {
    pub fn new(source: Arc<dyn MatchSource>, target: usize) -> Self {
        Self { source, target }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Resolves `filter` relative to `now`.
    ///
    /// An empty filter returns an empty resolution without touching the data
    /// source. Matches without a start time never count toward the target:
    /// both time-bounded queries exclude them.
    pub async fn resolve(&self, filter: &CanonicalFilter, now: DateTime<Utc>) -> Result<Resolution> {
        if filter.is_empty() || self.target == 0 {
            return Ok(Resolution::default());
        }

        let future = self.source.future_matches(filter, now, self.target).await?;
        debug!(count = future.len(), "Found future matches");

        let remaining = self.target.saturating_sub(future.len());
        let mut past = if remaining > 0 {
            let past = self.source.past_matches(filter, now, remaining).await?;
            debug!(count = past.len(), "Found past matches");
            past
        } else {
            Vec::new()
        };
        // closest-to-now first from the source; flip to chronological
        past.reverse();

        let using_past_fallback = future.is_empty() && !past.is_empty();
        let past_count = past.len();

        let mut matches = past;
        matches.extend(future);

        debug!(
            past = past_count,
            total = matches.len(),
            using_past_fallback,
            "Resolved preview matches"
        );
        Ok(Resolution {
            matches,
            using_past_fallback,
        })
    }
}

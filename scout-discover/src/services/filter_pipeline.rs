//! Filter pipeline
//!
//! Three independent, side-effect-free predicates combined with AND:
//! game type, rank range, and recency. The first failing predicate
//! short-circuits the rest.

use scout_common::rank::is_in_range;
use scout_common::{RankBound, RankInfo};

use crate::models::{FilterOptions, GameTypeFilter, LastActivity, PlayerRecord};

/// Game type must contain one of the filter's labels (case-insensitive).
///
/// `All` passes everything; a missing game type fails any specific filter.
pub fn matches_game_type(game_type: Option<&str>, filter: GameTypeFilter) -> bool {
    let Some(labels) = filter.labels() else {
        return true;
    };

    let Some(game_type) = game_type else {
        return false;
    };

    let normalized = game_type.to_lowercase();
    labels
        .iter()
        .any(|label| normalized.contains(&label.to_lowercase()))
}

/// Rank must fall within the bounds; unranked fails once any bound is set
pub fn matches_rank(
    rank: Option<&RankInfo>,
    min: Option<&RankBound>,
    max: Option<&RankBound>,
) -> bool {
    is_in_range(rank, min, max)
}

/// Last game must be at most `max_age_ms` ago.
///
/// Unknown recency never excludes a player.
pub fn matches_max_age(activity: Option<&LastActivity>, max_age_ms: Option<u64>) -> bool {
    match (activity, max_age_ms) {
        (Some(activity), Some(max_age)) => activity.ms_ago <= max_age,
        _ => true,
    }
}

/// Session-scoped predicate bundle
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    options: FilterOptions,
}

impl FilterPipeline {
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn accepts(&self, player: &PlayerRecord) -> bool {
        matches_game_type(player.last_game_type.as_deref(), self.options.game_type)
            && matches_rank(
                player.rank.as_ref(),
                self.options.min_rank.as_ref(),
                self.options.max_rank.as_ref(),
            )
            && matches_max_age(player.last_activity.as_ref(), self.options.max_age_ms)
    }
}

//! Session filter options (immutable for the lifetime of a session)

use std::fmt;
use std::str::FromStr;

use scout_common::{Error, RankBound, Result};
use serde::{Deserialize, Serialize};

/// Which kind of last game a player must have played
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameTypeFilter {
    #[default]
    All,
    Ranked,
    Normal,
    Aram,
}

impl GameTypeFilter {
    pub const ALL: [GameTypeFilter; 4] = [
        GameTypeFilter::All,
        GameTypeFilter::Ranked,
        GameTypeFilter::Normal,
        GameTypeFilter::Aram,
    ];

    /// Game-type labels accepted by this filter; `None` means no restriction
    pub fn labels(self) -> Option<&'static [&'static str]> {
        match self {
            GameTypeFilter::All => None,
            GameTypeFilter::Ranked => Some(&["Ranked Solo", "Ranked Flex"]),
            GameTypeFilter::Normal => Some(&["Normal", "Draft Pick", "Blind Pick", "Quickplay"]),
            GameTypeFilter::Aram => Some(&["ARAM"]),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameTypeFilter::All => "all",
            GameTypeFilter::Ranked => "ranked",
            GameTypeFilter::Normal => "normal",
            GameTypeFilter::Aram => "aram",
        }
    }

    /// Lenient parse: unrecognized values mean "no restriction"
    pub fn parse_or_all(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %s, "Unrecognized game type filter, not filtering by game type");
            GameTypeFilter::All
        })
    }
}

impl fmt::Display for GameTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameTypeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        GameTypeFilter::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == lower)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Invalid game-type '{}'. Must be one of: ranked, normal, aram, all",
                    s
                ))
            })
    }
}

/// Acceptance criteria applied to every fetched profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub game_type: GameTypeFilter,
    pub min_rank: Option<RankBound>,
    pub max_rank: Option<RankBound>,
    pub max_age_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strict_and_lenient() {
        assert_eq!("Ranked".parse::<GameTypeFilter>().unwrap(), GameTypeFilter::Ranked);
        assert!("urf".parse::<GameTypeFilter>().is_err());
        assert_eq!(GameTypeFilter::parse_or_all("urf"), GameTypeFilter::All);
        assert_eq!(GameTypeFilter::parse_or_all("aram"), GameTypeFilter::Aram);
    }

    #[test]
    fn test_labels() {
        assert!(GameTypeFilter::All.labels().is_none());
        assert_eq!(GameTypeFilter::Aram.labels(), Some(&["ARAM"][..]));
        assert_eq!(GameTypeFilter::Normal.labels().map(<[_]>::len), Some(4));
    }
}

//! Rank scale: total ordering over tier + division
//!
//! `value = tier_index * 4 + division_index`
//!
//! - Divisions order iv=0, iii=1, ii=2, i=3.
//! - Tiers at or above Master have no divisions and always sit at index 3.
//! - A missing division counts as `i` (index 3), the top of its tier. This
//!   applies the same way to range bounds and to a player's own rank.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of division slots per tier on the scale
const DIVISIONS_PER_TIER: u32 = 4;

/// Division index used for apex tiers and for an absent division
const TOP_DIVISION_INDEX: u32 = 3;

/// Competitive tier, ordered low → high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 10] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// Position on the scale (iron = 0)
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Master and above carry no division
    pub fn is_apex(self) -> bool {
        self >= Tier::Master
    }

    /// Lowercase name as used on the wire and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Iron => "iron",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Emerald => "emerald",
            Tier::Diamond => "diamond",
            Tier::Master => "master",
            Tier::Grandmaster => "grandmaster",
            Tier::Challenger => "challenger",
        }
    }

    /// Comma-separated list of valid tier names, for error messages
    pub fn names() -> String {
        Tier::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Invalid rank '{}'. Must be one of: {}",
                    s,
                    Tier::names()
                ))
            })
    }
}

/// Division within a tier, ordered low → high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    Iv,
    Iii,
    Ii,
    I,
}

impl Division {
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Division::Iv => "iv",
            Division::Iii => "iii",
            Division::Ii => "ii",
            Division::I => "i",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "iv" => Ok(Division::Iv),
            "iii" => Ok(Division::Iii),
            "ii" => Ok(Division::Ii),
            "i" => Ok(Division::I),
            other => Err(Error::InvalidInput(format!(
                "Invalid division '{}'. Must be one of: iv, iii, ii, i",
                other
            ))),
        }
    }
}

/// A player's ranked standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    pub tier: Tier,
    #[serde(default)]
    pub division: Option<Division>,
    #[serde(rename = "lp", default)]
    pub league_points: u32,
}

impl RankInfo {
    /// Build a rank, dropping any division supplied for an apex tier
    pub fn new(tier: Tier, division: Option<Division>, league_points: u32) -> Self {
        Self {
            tier,
            division: if tier.is_apex() { None } else { division },
            league_points,
        }
    }

    pub fn value(&self) -> u32 {
        rank_value(self.tier, self.division)
    }
}

impl fmt::Display for RankInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tier = self.tier.as_str();
        let mut chars = tier.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        if let Some(division) = self.division {
            write!(f, " {}", division.as_str().to_uppercase())?;
        }
        write!(f, " {}LP", self.league_points)
    }
}

/// A filter bound: a tier with an optional explicit division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBound {
    pub tier: Tier,
    #[serde(default)]
    pub division: Option<Division>,
}

impl RankBound {
    pub fn tier(tier: Tier) -> Self {
        Self {
            tier,
            division: None,
        }
    }

    pub fn value(&self) -> u32 {
        rank_value(self.tier, self.division)
    }
}

impl fmt::Display for RankBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.division {
            Some(division) if !self.tier.is_apex() => write!(f, "{} {}", self.tier, division),
            _ => write!(f, "{}", self.tier),
        }
    }
}

impl FromStr for RankBound {
    type Err = Error;

    /// Accepts `gold`, `gold ii`, `gold-ii`, `Gold_II`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|p| !p.is_empty());

        let tier: Tier = parts
            .next()
            .ok_or_else(|| Error::InvalidInput("Rank must not be empty".to_string()))?
            .parse()?;
        let division = parts.next().map(str::parse::<Division>).transpose()?;

        if parts.next().is_some() {
            return Err(Error::InvalidInput(format!("Invalid rank '{}'", s)));
        }

        Ok(RankBound { tier, division })
    }
}

/// Position of (tier, division) on the scale
///
/// Strictly increasing in tier, then division. Apex tiers ignore the
/// supplied division; an absent division counts as `i`.
pub fn rank_value(tier: Tier, division: Option<Division>) -> u32 {
    let division_index = if tier.is_apex() {
        TOP_DIVISION_INDEX
    } else {
        division.map_or(TOP_DIVISION_INDEX, Division::index)
    };
    tier.index() * DIVISIONS_PER_TIER + division_index
}

/// Check a rank against optional lower/upper bounds (both inclusive)
///
/// An unranked player never matches once either bound is set.
pub fn is_in_range(
    rank: Option<&RankInfo>,
    min: Option<&RankBound>,
    max: Option<&RankBound>,
) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }

    let Some(rank) = rank else {
        return false;
    };
    let value = rank.value();

    if let Some(min) = min {
        if value < min.value() {
            return false;
        }
    }

    if let Some(max) = max {
        if value > max.value() {
            return false;
        }
    }

    true
}

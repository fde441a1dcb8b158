//! Server regions

use std::fmt;
use std::str::FromStr;

use scout_common::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Na,
    Euw,
    Eune,
    Kr,
    Br,
    Lan,
    Las,
    Oce,
    Tr,
    Ru,
    Jp,
}

impl Region {
    pub const ALL: [Region; 11] = [
        Region::Na,
        Region::Euw,
        Region::Eune,
        Region::Kr,
        Region::Br,
        Region::Lan,
        Region::Las,
        Region::Oce,
        Region::Tr,
        Region::Ru,
        Region::Jp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Na => "na",
            Region::Euw => "euw",
            Region::Eune => "eune",
            Region::Kr => "kr",
            Region::Br => "br",
            Region::Lan => "lan",
            Region::Las => "las",
            Region::Oce => "oce",
            Region::Tr => "tr",
            Region::Ru => "ru",
            Region::Jp => "jp",
        }
    }

    /// Region segment used in profile URLs (`na` is published as `na1`)
    pub fn site_code(self) -> &'static str {
        match self {
            Region::Na => "na1",
            other => other.as_str(),
        }
    }

    /// Inverse of [`Region::site_code`]
    pub fn from_site_code(code: &str) -> Option<Region> {
        match code.to_lowercase().as_str() {
            "na1" => Some(Region::Na),
            other => other.parse().ok(),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| {
                let valid: Vec<&str> = Region::ALL.iter().map(|r| r.as_str()).collect();
                Error::InvalidInput(format!(
                    "Invalid region '{}'. Must be one of: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

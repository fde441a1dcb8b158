//! Account identity (`Name#Tag`)
//!
//! Equality and hashing are case-insensitive and go through the canonical
//! key (lowercase `name#tag`), so `Faker#T1` and `faker#t1` are the same
//! account for dedup and storage lookups. Display keeps the original casing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A (name, tag) pair uniquely denoting an account
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub tag: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Canonical storage key: lowercase `name#tag`
    pub fn key(&self) -> String {
        format!("{}#{}", self.name.to_lowercase(), self.tag.to_lowercase())
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase()
            && self.tag.to_lowercase() == other.tag.to_lowercase()
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.tag)
    }
}

impl FromStr for Identity {
    type Err = Error;

    /// Parse `Name#Tag`. Exactly one `#` with non-empty parts on both sides.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('#').collect();
        match parts.as_slice() {
            [name, tag] if !name.trim().is_empty() && !tag.trim().is_empty() => {
                Ok(Identity::new(name.trim(), tag.trim()))
            }
            _ => Err(Error::InvalidInput(format!(
                "Seed must be in format Name#Tag (e.g., Faker#T1), got '{}'",
                s
            ))),
        }
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

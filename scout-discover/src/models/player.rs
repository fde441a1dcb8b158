//! Player records and neighbor candidates
//!
//! The persisted JSON shape is fixed: `summonerName, tag, riotId, region,
//! rank{tier,division,lp}, lastGameType, lastGameTime{timestamp,relativeTime,msAgo},
//! discoveredFrom, discoveredAt, profileUrl`.

use chrono::{DateTime, Duration, Utc};
use scout_common::{Identity, RankInfo};
use serde::{Deserialize, Serialize};

use super::Region;

/// When the player last finished a game
///
/// Either fully known or absent; there is no partial form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastActivity {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "relativeTime")]
    pub relative_label: String,
    pub ms_ago: u64,
}

impl LastActivity {
    /// Activity `ms_ago` milliseconds before `now`
    pub fn new(ms_ago: u64, relative_label: impl Into<String>, now: DateTime<Utc>) -> Self {
        let offset = i64::try_from(ms_ago)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::zero());
        Self {
            timestamp: now - offset,
            relative_label: relative_label.into(),
            ms_ago,
        }
    }
}

/// A discovered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub summoner_name: String,
    pub tag: String,
    pub riot_id: String,
    pub region: Region,
    #[serde(default)]
    pub rank: Option<RankInfo>,
    #[serde(default)]
    pub last_game_type: Option<String>,
    #[serde(default, rename = "lastGameTime")]
    pub last_activity: Option<LastActivity>,
    #[serde(default)]
    pub discovered_from: Option<Identity>,
    /// Set by the result store at insertion
    #[serde(default)]
    pub discovered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile_url: Option<String>,
}

impl PlayerRecord {
    pub fn new(identity: &Identity, region: Region) -> Self {
        Self {
            summoner_name: identity.name.clone(),
            tag: identity.tag.clone(),
            riot_id: identity.to_string(),
            region,
            rank: None,
            last_game_type: None,
            last_activity: None,
            discovered_from: None,
            discovered_at: None,
            profile_url: None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.summoner_name.clone(), self.tag.clone())
    }

    /// Canonical dedup key (lowercase `name#tag`)
    pub fn key(&self) -> String {
        self.identity().key()
    }

    /// Fold the candidate's discovery metadata into a freshly fetched profile.
    ///
    /// Hints from the neighbor listing win when present; otherwise the
    /// profile's own parsed values are kept.
    pub fn merge_candidate(mut self, candidate: &Candidate) -> Self {
        if candidate.game_type.is_some() {
            self.last_game_type = candidate.game_type.clone();
        }
        if candidate.last_activity.is_some() {
            self.last_activity = candidate.last_activity.clone();
        }
        if candidate.discovered_from.is_some() {
            self.discovered_from = candidate.discovered_from.clone();
        }
        self
    }
}

/// A co-participant pulled from the seed's recent activity, not yet fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub identity: Identity,
    pub region: Region,
    pub game_type: Option<String>,
    pub last_activity: Option<LastActivity>,
    pub discovered_from: Option<Identity>,
}

impl Candidate {
    pub fn new(identity: Identity, region: Region) -> Self {
        Self {
            identity,
            region,
            game_type: None,
            last_activity: None,
            discovered_from: None,
        }
    }
}

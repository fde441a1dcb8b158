//! Shared fixtures for scout-discover integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use scout_common::{Division, Identity, RankInfo, Tier};
use scout_discover::models::{Candidate, LastActivity, PlayerRecord, Region};
use scout_discover::services::{ProfileSource, SourceError};

/// How the scripted source answers for one identity
#[derive(Clone)]
pub enum Script {
    Profile(PlayerRecord),
    Missing,
    Fail,
}

/// In-memory profile source with canned answers
pub struct ScriptedSource {
    neighbors: Result<Vec<Candidate>, u16>,
    profiles: HashMap<String, Script>,
    delay: Duration,
    pub profile_calls: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub requested: Mutex<Vec<Identity>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            neighbors: Ok(Vec::new()),
            profiles: HashMap::new(),
            delay: Duration::ZERO,
            profile_calls: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Neighbor list returned for any seed
    pub fn with_neighbors(mut self, ids: &[&str]) -> Self {
        self.neighbors = Ok(ids
            .iter()
            .map(|id| Candidate::new(id.parse().unwrap(), Region::Na))
            .collect());
        self
    }

    /// Neighbor listing fails with this HTTP status
    pub fn with_neighbor_failure(mut self, status: u16) -> Self {
        self.neighbors = Err(status);
        self
    }

    pub fn with_profile(mut self, record: PlayerRecord) -> Self {
        self.profiles.insert(record.key(), Script::Profile(record));
        self
    }

    pub fn with_script(mut self, id: &str, script: Script) -> Self {
        let identity: Identity = id.parse().unwrap();
        self.profiles.insert(identity.key(), script);
        self
    }

    /// Delay applied to every profile fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn profile_call_count(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileSource for ScriptedSource {
    async fn fetch_profile(
        &self,
        _region: Region,
        identity: &Identity,
    ) -> Result<Option<PlayerRecord>, SourceError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(identity.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.profiles.get(&identity.key()) {
            Some(Script::Profile(record)) => Ok(Some(record.clone())),
            Some(Script::Fail) => Err(SourceError::Network("connection reset".to_string())),
            Some(Script::Missing) | None => Ok(None),
        }
    }

    async fn fetch_neighbors(
        &self,
        _region: Region,
        _identity: &Identity,
    ) -> Result<Vec<Candidate>, SourceError> {
        match &self.neighbors {
            Ok(list) => Ok(list.clone()),
            Err(status) => Err(SourceError::Status(*status)),
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Ranked, recently active player
pub fn player(id: &str, tier: Tier, division: Option<Division>) -> PlayerRecord {
    let identity: Identity = id.parse().unwrap();
    let mut record = PlayerRecord::new(&identity, Region::Na);
    record.rank = Some(RankInfo::new(tier, division, 50));
    record.last_game_type = Some("Ranked Solo".to_string());
    record.last_activity = Some(LastActivity::new(600_000, "10 minutes ago", Utc::now()));
    record
}

pub fn shared(source: ScriptedSource) -> Arc<ScriptedSource> {
    Arc::new(source)
}

//! Result store
//!
//! Deduplicated player records plus the seen-set, persisted as a single
//! JSON array. The store is the only writer of its file.
//!
//! - Records are keyed by canonical identity; first write wins.
//! - The seen-set is independent of the records: an identity can be seen
//!   (queued for fetching) without ever being stored (passing filters).
//! - A missing or corrupt file loads as an empty store.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use scout_common::{Identity, LogSink, Result};

use crate::models::PlayerRecord;

/// Canonical keys of every identity expanded or queued this session.
///
/// Grows monotonically; nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    keys: HashSet<String>,
}

impl SeenSet {
    pub fn contains(&self, identity: &Identity) -> bool {
        self.keys.contains(&identity.key())
    }

    /// Returns true if the identity was not seen before
    pub fn insert(&mut self, identity: &Identity) -> bool {
        self.keys.insert(identity.key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub struct ResultStore {
    path: PathBuf,
    /// Insertion order; persisted as-is
    players: Vec<PlayerRecord>,
    index: HashMap<String, usize>,
    seen: SeenSet,
    log: LogSink,
}

impl ResultStore {
    /// Open the store backed by `path`, loading any existing records.
    ///
    /// Previously stored players are also marked seen so a rerun over the
    /// same file does not fetch them again.
    pub fn open(path: impl Into<PathBuf>, log: LogSink) -> Self {
        let mut store = Self {
            path: path.into(),
            players: Vec::new(),
            index: HashMap::new(),
            seen: SeenSet::default(),
            log,
        };
        store.load();
        store
    }

    fn load(&mut self) {
        if !self.path.exists() {
            return;
        }

        let loaded = std::fs::read_to_string(&self.path)
            .map_err(scout_common::Error::from)
            .and_then(|content| {
                serde_json::from_str::<Vec<PlayerRecord>>(&content).map_err(Into::into)
            });

        match loaded {
            Ok(players) => {
                for player in players {
                    let key = player.key();
                    if self.index.contains_key(&key) {
                        continue;
                    }
                    self.seen.insert(&player.identity());
                    self.index.insert(key, self.players.len());
                    self.players.push(player);
                }
                self.log.info(format!(
                    "Loaded {} existing players from {}",
                    self.players.len(),
                    self.path.display()
                ));
            }
            Err(e) => {
                self.log.error(format!(
                    "Error loading existing data from {}: {}",
                    self.path.display(),
                    e
                ));
            }
        }
    }

    /// Insert a record unless its identity is already stored.
    ///
    /// Stamps `discovered_at` on insertion. Returns whether an insertion happened.
    pub fn add_player(&mut self, mut player: PlayerRecord) -> bool {
        let key = player.key();
        if self.index.contains_key(&key) {
            return false;
        }

        player.discovered_at = Some(Utc::now());
        self.index.insert(key, self.players.len());
        self.players.push(player);
        true
    }

    pub fn has_player(&self, identity: &Identity) -> bool {
        self.index.contains_key(&identity.key())
    }

    pub fn get_player(&self, identity: &Identity) -> Option<&PlayerRecord> {
        self.index
            .get(&identity.key())
            .and_then(|&i| self.players.get(i))
    }

    pub fn has_seen(&self, identity: &Identity) -> bool {
        self.seen.contains(identity)
    }

    pub fn mark_seen(&mut self, identity: &Identity) {
        self.seen.insert(identity);
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// Snapshot of all records in insertion order
    pub fn players(&self) -> Vec<PlayerRecord> {
        self.players.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all records to the backing file, replacing its contents.
    ///
    /// Safe to call repeatedly. Returns the number of records written.
    pub fn save(&self) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.players)?;
        std::fs::write(&self.path, json)?;

        self.log.info(format!(
            "Saved {} players to {}",
            self.players.len(),
            self.path.display()
        ));
        Ok(self.players.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use tempfile::TempDir;

    fn record(name: &str, tag: &str) -> PlayerRecord {
        PlayerRecord::new(&Identity::new(name, tag), Region::Na)
    }

    #[test]
    fn test_add_player_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = ResultStore::open(dir.path().join("out.json"), LogSink::default());

        assert!(store.add_player(record("Faker", "T1")));
        assert!(!store.add_player(record("faker", "t1")));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_first_write_wins_and_stamps_discovered_at() {
        let dir = TempDir::new().unwrap();
        let mut store = ResultStore::open(dir.path().join("out.json"), LogSink::default());

        let mut first = record("Faker", "T1");
        first.last_game_type = Some("ARAM".to_string());
        let mut second = record("Faker", "T1");
        second.last_game_type = Some("Ranked Solo".to_string());

        store.add_player(first);
        store.add_player(second);

        let stored = store.get_player(&Identity::new("Faker", "T1")).unwrap();
        assert_eq!(stored.last_game_type.as_deref(), Some("ARAM"));
        assert!(stored.discovered_at.is_some());
    }

    #[test]
    fn test_seen_is_independent_of_stored() {
        let dir = TempDir::new().unwrap();
        let mut store = ResultStore::open(dir.path().join("out.json"), LogSink::default());
        let id = Identity::new("Caps", "G2");

        assert!(!store.has_seen(&id));
        store.mark_seen(&id);
        store.mark_seen(&id);
        assert!(store.has_seen(&Identity::new("CAPS", "g2")));
        assert!(!store.has_player(&id));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_save_and_reload_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        {
            let mut store = ResultStore::open(&path, LogSink::default());
            store.add_player(record("Zed", "NA1"));
            store.add_player(record("Ahri", "NA1"));
            store.add_player(record("Lux", "NA1"));
            assert_eq!(store.save().unwrap(), 3);
            assert_eq!(store.save().unwrap(), 3);
        }

        let reloaded = ResultStore::open(&path, LogSink::default());
        let names: Vec<String> = reloaded
            .players()
            .into_iter()
            .map(|p| p.summoner_name)
            .collect();
        assert_eq!(names, vec!["Zed", "Ahri", "Lux"]);
        assert!(reloaded.has_seen(&Identity::new("ahri", "na1")));
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::open(dir.path().join("missing.json"), LogSink::default());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_corrupt_file_is_empty_store_and_logged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        let log = LogSink::default();
        let store = ResultStore::open(&path, log.clone());
        assert_eq!(store.count(), 0);
        assert!(log
            .entries_since(0)
            .iter()
            .any(|e| e.message.contains("Error loading existing data")));
    }

    #[test]
    fn test_save_to_unwritable_path_is_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be overwritten as a file
        let store = ResultStore::open(dir.path(), LogSink::default());
        assert!(store.save().is_err());
    }
}

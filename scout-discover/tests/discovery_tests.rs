//! End-to-end discovery sessions against a scripted profile source

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{player, shared, Script, ScriptedSource};
use scout_common::{Division, Identity, LogSink, RankBound, Tier};
use scout_discover::models::{DiscoveryState, FilterOptions, PlayerRecord};
use scout_discover::services::{DiscoveryConfig, DiscoveryEngine};
use scout_discover::DiscoveryError;
use tempfile::TempDir;

fn config(dir: &TempDir, result_cap: usize) -> DiscoveryConfig {
    DiscoveryConfig {
        result_cap,
        output_path: dir.path().join("players.json"),
        ..DiscoveryConfig::default()
    }
}

fn engine(config: DiscoveryConfig, source: &Arc<ScriptedSource>) -> DiscoveryEngine {
    DiscoveryEngine::new(config, source.clone(), LogSink::default())
        .with_inter_chunk_delay(Duration::ZERO)
}

fn saved(dir: &TempDir) -> Vec<PlayerRecord> {
    let content = std::fs::read_to_string(dir.path().join("players.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn seed() -> Identity {
    Identity::new("Faker", "T1")
}

#[tokio::test]
async fn test_result_cap_bounds_stored_players() {
    let dir = TempDir::new().unwrap();
    let ids = ["A#1", "B#2", "C#3", "D#4", "E#5"];
    let mut source = ScriptedSource::new().with_neighbors(&ids);
    for id in ids {
        source = source.with_profile(player(id, Tier::Gold, Some(Division::Ii)));
    }
    let source = shared(source);
    let engine = engine(config(&dir, 3), &source);

    let results = engine.discover(&seed()).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(saved(&dir).len(), 3);
    // Reaching the cap only gates acceptance; the remaining two are still fetched
    assert_eq!(source.profile_call_count(), 5);
    assert_eq!(engine.state(), DiscoveryState::Completed);
    assert!(!engine.timed_out());
    assert_eq!(source.shutdown_count(), 1);

    for record in &results {
        assert_eq!(record.discovered_from, Some(seed()));
        assert!(record.discovered_at.is_some());
    }
}

#[tokio::test]
async fn test_duplicate_and_seed_neighbors_fetched_once() {
    let dir = TempDir::new().unwrap();
    let source = shared(
        ScriptedSource::new()
            .with_neighbors(&["A#1", "a#1", "Faker#T1", "B#2", "A#1"])
            .with_profile(player("A#1", Tier::Silver, None))
            .with_profile(player("B#2", Tier::Silver, None)),
    );
    let engine = engine(config(&dir, 10), &source);

    let results = engine.discover(&seed()).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(source.profile_call_count(), 2);
    let requested = source.requested.lock().unwrap().clone();
    assert!(!requested.contains(&seed()));
}

#[tokio::test]
async fn test_rank_filter_applies_division_bound() {
    let dir = TempDir::new().unwrap();
    let source = shared(
        ScriptedSource::new()
            .with_neighbors(&["Low#1", "High#2", "Plat#3"])
            .with_profile(player("Low#1", Tier::Gold, Some(Division::Iv)))
            .with_profile(player("High#2", Tier::Gold, Some(Division::I)))
            .with_profile(player("Plat#3", Tier::Platinum, Some(Division::Iv))),
    );
    let mut config = config(&dir, 10);
    config.filters = FilterOptions {
        min_rank: Some("gold-ii".parse::<RankBound>().unwrap()),
        max_rank: Some(RankBound::tier(Tier::Gold)),
        ..FilterOptions::default()
    };
    let engine = engine(config, &source);

    let results = engine.discover(&seed()).await.unwrap();

    let names: Vec<_> = results.iter().map(|r| r.riot_id.as_str()).collect();
    assert_eq!(names, vec!["High#2"]);
}

#[tokio::test]
async fn test_failed_and_missing_profiles_are_skipped() {
    let dir = TempDir::new().unwrap();
    let source = shared(
        ScriptedSource::new()
            .with_neighbors(&["Gone#1", "Broken#2", "Fine#3"])
            .with_script("Gone#1", Script::Missing)
            .with_script("Broken#2", Script::Fail)
            .with_profile(player("Fine#3", Tier::Bronze, None)),
    );
    let engine = engine(config(&dir, 10), &source);

    let results = engine.discover(&seed()).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].riot_id, "Fine#3");
    let messages: Vec<_> = engine
        .log()
        .entries_since(0)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert!(messages.iter().any(|m| m.contains("Profile not available: Gone#1")));
    assert!(messages.iter().any(|m| m.contains("Error fetching Broken#2")));
}

#[tokio::test]
async fn test_seed_failure_is_fatal_but_releases_source() {
    let dir = TempDir::new().unwrap();
    let source = shared(ScriptedSource::new().with_neighbor_failure(500));
    let engine = engine(config(&dir, 10), &source);

    let outcome = engine.discover(&seed()).await;

    assert!(matches!(outcome, Err(DiscoveryError::Source { .. })));
    assert_eq!(engine.state(), DiscoveryState::Stopped);
    assert_eq!(source.shutdown_count(), 1);
    assert!(dir.path().join("players.json").exists());
}

#[tokio::test]
async fn test_stop_cancels_in_flight_fetches() {
    let dir = TempDir::new().unwrap();
    let ids = ["A#1", "B#2", "C#3", "D#4", "E#5", "F#6"];
    let mut source = ScriptedSource::new()
        .with_neighbors(&ids)
        .with_delay(Duration::from_secs(5));
    for id in ids {
        source = source.with_profile(player(id, Tier::Gold, None));
    }
    let source = shared(source);
    let engine = Arc::new(engine(config(&dir, 10), &source));

    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.discover(&seed()).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.is_running());
    engine.stop().await;

    let results = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("discover did not return after stop")
        .unwrap()
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(engine.state(), DiscoveryState::Stopped);
    assert!(source.profile_call_count() <= 3);
    assert_eq!(source.shutdown_count(), 1);
    assert!(dir.path().join("players.json").exists());
}

#[tokio::test]
async fn test_time_limit_keeps_session_completed() {
    let dir = TempDir::new().unwrap();
    let source = shared(
        ScriptedSource::new()
            .with_neighbors(&["A#1", "B#2"])
            .with_profile(player("A#1", Tier::Gold, None))
            .with_profile(player("B#2", Tier::Gold, None)),
    );
    let mut config = config(&dir, 10);
    config.max_duration = Some(Duration::ZERO);
    let engine = engine(config, &source);

    let results = engine.discover(&seed()).await.unwrap();

    assert!(results.is_empty());
    assert!(engine.timed_out());
    assert_eq!(engine.state(), DiscoveryState::Completed);
    assert_eq!(source.profile_call_count(), 2);

    let timeouts = engine
        .log()
        .entries_since(0)
        .into_iter()
        .filter(|e| e.message.starts_with("[Timeout]"))
        .count();
    assert_eq!(timeouts, 1);
}

#[tokio::test]
async fn test_warm_start_keeps_and_skips_loaded_players() {
    let dir = TempDir::new().unwrap();
    let existing = vec![player("Old#1", Tier::Iron, None)];
    std::fs::write(
        dir.path().join("players.json"),
        serde_json::to_string(&existing).unwrap(),
    )
    .unwrap();

    let source = shared(
        ScriptedSource::new()
            .with_neighbors(&["old#1", "New#2"])
            .with_profile(player("Old#1", Tier::Diamond, None))
            .with_profile(player("New#2", Tier::Gold, None)),
    );
    let engine = engine(config(&dir, 10), &source);

    let results = engine.discover(&seed()).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(source.profile_call_count(), 1);
    let old = results.iter().find(|r| r.riot_id == "Old#1").unwrap();
    assert_eq!(old.rank.as_ref().map(|r| r.tier), Some(Tier::Iron));
    assert_eq!(saved(&dir).len(), 2);
}

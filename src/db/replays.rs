use chrono::{DateTime, Utc};
use osu_db::{Replay, ScoreList};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::db::misc::{replay_file_ticks, windows_ticks};
use crate::db::ReplayRecord;
use crate::error::{Error, Result};

/// Read-only view of the attempt database, grouped by beatmap checksum.
///
/// Checksums keep the order in which they were first seen so that a test run
/// always picks the same beatmaps.
#[derive(Debug, Default, Clone)]
pub struct ReplayStore {
    order: Vec<String>,
    replays: HashMap<String, Vec<ReplayRecord>>,
}

impl ReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, checksum: String, record: ReplayRecord) {
        match self.replays.get_mut(&checksum) {
            Some(list) => list.push(record),
            None => {
                self.order.push(checksum.clone());
                self.replays.insert(checksum, vec![record]);
            }
        }
    }

    pub fn checksums(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, checksum: &str) -> &[ReplayRecord] {
        self.replays.get(checksum).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.replays
            .values()
            .flat_map(|list| list.iter().map(|r| r.timestamp))
            .max()
    }

    /// Adds loose `.osr` files from `replay_dir` (osu!'s `Data/r`) that were
    /// recorded after the newest attempt already in the store.
    ///
    /// Returns how many replays were merged. Unreadable files are skipped.
    pub fn merge_unstored(&mut self, replay_dir: &Path) -> usize {
        let since = self.latest_timestamp();
        let since_ticks = since.map(windows_ticks).unwrap_or(0);

        let fresh: Vec<(String, ReplayRecord)> = WalkDir::new(replay_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                replay_file_ticks(entry.path()).is_some_and(|ticks| ticks > since_ticks)
            })
            .filter_map(|entry| match Replay::from_file(entry.path()) {
                Ok(rep) => ReplayRecord::from_replay(&rep),
                Err(e) => {
                    log::warn!("skipping unreadable replay {}: {e}", entry.path().display());
                    None
                }
            })
            .filter(|(_, record)| since.is_none_or(|ts| record.timestamp > ts))
            .collect();

        let merged = fresh.len();
        for (checksum, record) in fresh {
            self.insert(checksum, record);
        }
        if merged > 0 {
            log::info!("merged {merged} replays from {}", replay_dir.display());
        }
        merged
    }
}

/// Reads scores.db into a [`ReplayStore`].
pub fn load_replays(scores_db_path: &Path) -> Result<ReplayStore> {
    let scores = ScoreList::from_file(scores_db_path).map_err(|e| Error::Database {
        path: scores_db_path.to_path_buf(),
        source: e.into(),
    })?;

    let mut store = ReplayStore::new();
    for beatmap in scores.beatmaps {
        for rep in beatmap.scores {
            if let Some((checksum, record)) = ReplayRecord::from_replay(&rep) {
                store.insert(checksum, record);
            }
        }
    }
    log::info!(
        "read replays for {} beatmaps from {}",
        store.len(),
        scores_db_path.display()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::LegacyMods;
    use crate::db::GameMode;
    use crate::db::misc::get_replay_file_name;
    use chrono::TimeZone;
    use osu_db::{ModSet, Mode};

    fn record(player: &str, day: u32) -> ReplayRecord {
        ReplayRecord {
            player: player.into(),
            mode: GameMode::Standard,
            count_300: 100,
            count_100: 0,
            count_50: 0,
            count_miss: 0,
            max_combo: 100,
            mods: LegacyMods::default(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn groups_by_checksum_in_first_seen_order() {
        let mut store = ReplayStore::new();
        store.insert("b".into(), record("p", 1));
        store.insert("a".into(), record("p", 2));
        store.insert("b".into(), record("q", 3));

        assert_eq!(store.checksums(), ["b".to_string(), "a".to_string()]);
        assert_eq!(store.get("b").len(), 2);
        assert!(store.get("missing").is_empty());
        assert_eq!(
            store.latest_timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap())
        );
    }

    fn write_osr(dir: &Path, checksum: &str, day: u32) {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        let rep = Replay {
            mode: Mode::Standard,
            version: 20240101,
            beatmap_hash: Some(checksum.into()),
            player_name: Some("p".into()),
            replay_hash: Some("r".into()),
            count_300: 300,
            count_100: 4,
            count_50: 1,
            count_geki: 0,
            count_katsu: 0,
            count_miss: 2,
            score: 1_000_000,
            max_combo: 250,
            perfect_combo: false,
            mods: ModSet::empty(),
            life_graph: None,
            timestamp,
            replay_data: Some(Vec::new()),
            raw_replay_data: None,
            online_score_id: 0,
        };
        rep.save(dir.join(get_replay_file_name(timestamp, checksum)), None)
            .unwrap();
    }

    #[test]
    fn merge_keeps_only_replays_newer_than_store() {
        let dir = tempfile::tempdir().unwrap();
        write_osr(dir.path(), "old", 1);
        write_osr(dir.path(), "new", 20);

        let mut store = ReplayStore::new();
        store.insert("base".into(), record("p", 10));

        assert_eq!(store.merge_unstored(dir.path()), 1);
        assert_eq!(store.checksums(), ["base".to_string(), "new".to_string()]);
        let merged = &store.get("new")[0];
        assert_eq!(merged.count_300, 300);
        assert_eq!(merged.count_miss, 2);
        assert_eq!(merged.max_combo, 250);
    }

    #[test]
    fn merge_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken-1.osr"), "not a replay").unwrap();

        let mut store = ReplayStore::new();
        store.insert("a".into(), record("p", 1));
        assert_eq!(store.merge_unstored(dir.path()), 0);
        assert_eq!(store.len(), 1);
    }
}

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::calc::{PerformanceEngine, RecalculatedScore, select_best};
use crate::config::{RunOptions, TEST_RUN_BEATMAPS};
use crate::db::{CatalogIndex, ReplayStore};
use crate::error::Result;

/// Best play per beatmap, filled concurrently by the workers.
///
/// Append-only: a checksum that is already present is never overwritten.
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: Mutex<HashMap<String, RecalculatedScore>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and keeps the existing entry) if the checksum was
    /// already inserted.
    pub fn insert(&self, score: RecalculatedScore) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&score.checksum) {
            log::error!("beatmap {} was processed twice", score.checksum);
            return false;
        }
        entries.insert(score.checksum.clone(), score);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the accumulator, ordered by checksum so later stable sorts are
    /// reproducible.
    pub fn into_sorted(self) -> Vec<RecalculatedScore> {
        let entries = self.entries.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut scores: Vec<_> = entries.into_values().collect();
        scores.sort_by(|a, b| a.checksum.cmp(&b.checksum));
        scores
    }
}

/// Checksums a run works on, in replay store order.
pub fn work_set<'a>(store: &'a ReplayStore, options: &RunOptions) -> &'a [String] {
    let keys = store.checksums();
    if options.test_run {
        &keys[..keys.len().min(TEST_RUN_BEATMAPS)]
    } else {
        keys
    }
}

/// Runs [`select_best`] for every beatmap in the replay store on a rayon pool
/// and returns the drained accumulator.
pub fn dispatch<E: PerformanceEngine>(
    index: &CatalogIndex,
    store: &ReplayStore,
    engine: &E,
    options: &RunOptions,
) -> Result<Vec<RecalculatedScore>> {
    let keys = work_set(store, options);
    log::info!(
        "Processing {} beatmaps (this may take a while!)",
        keys.len()
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(0))
        .build()?;
    let accumulator = Accumulator::new();

    pool.install(|| {
        keys.par_iter().for_each(|checksum| {
            let replays = store.get(checksum);
            let path = index.resolve(checksum);
            if let Some(best) = select_best(engine, checksum, replays, path, options) {
                accumulator.insert(best);
            }
        })
    });

    log::info!("Done recalcing replays");
    Ok(accumulator.into_sorted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{LegacyMods, ScoreSnapshot};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn score(checksum: &str, pp: f64) -> RecalculatedScore {
        RecalculatedScore {
            checksum: checksum.into(),
            map_name: checksum.into(),
            player: "me".into(),
            timestamp: Utc::now(),
            pp,
            attributes: BTreeMap::new(),
            score: ScoreSnapshot {
                accuracy: 1.0,
                max_combo: 1,
                map_max_combo: 1,
                count_great: 1,
                count_good: 0,
                count_meh: 0,
                count_miss: 0,
                mods: LegacyMods::default(),
            },
        }
    }

    #[test]
    fn accumulator_rejects_second_entry_for_checksum() {
        let acc = Accumulator::new();
        assert!(acc.insert(score("c1", 100.0)));
        assert!(!acc.insert(score("c1", 200.0)));
        assert!(acc.insert(score("c0", 50.0)));

        let drained = acc.into_sorted();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].checksum, "c0");
        assert_eq!(drained[1].pp, 100.0);
    }

    #[test]
    fn concurrent_inserts_are_not_lost() {
        let acc = Accumulator::new();
        (0..1000).into_par_iter().for_each(|i| {
            acc.insert(score(&format!("c{i}"), i as f64));
        });
        assert_eq!(acc.len(), 1000);
    }

    #[test]
    fn poisoned_accumulator_still_counts_entries() {
        let acc = Accumulator::new();
        acc.insert(score("c1", 100.0));
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = acc.entries.lock().unwrap();
            panic!("worker died");
        }));
        assert!(acc.entries.is_poisoned());

        assert_eq!(acc.len(), 1);
        assert!(acc.insert(score("c2", 50.0)));
        assert_eq!(acc.into_sorted().len(), 2);
    }
}

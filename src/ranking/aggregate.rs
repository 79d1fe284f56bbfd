use serde::Serialize;

use crate::calc::RecalculatedScore;
use crate::config::SortKey;
use crate::error::{Error, Result};

pub const MAX_NAME_LENGTH: usize = 120;
pub const DECAY_BASE: f64 = 0.95;
pub const BONUS_CEILING: f64 = 416.6667;
pub const BONUS_BASE: f64 = 0.9994;

/// Top plays in rank order plus the aggregate numbers derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct RankedReport {
    pub entries: Vec<RecalculatedScore>,
    /// Number of beatmaps with a best play, before truncation.
    pub total_entries: usize,
    pub weighted_total: f64,
    pub bonus: f64,
}

impl RankedReport {
    pub fn local_pp(&self) -> f64 {
        self.weighted_total + self.bonus
    }
}

/// Sorts the best plays by `sort_key`, keeps the first `top_n` and computes
/// the weighted total and playcount bonus.
///
/// Fails if `sort_key` names an attribute that any entry lacks.
pub fn rank(
    mut best: Vec<RecalculatedScore>,
    sort_key: &SortKey,
    top_n: usize,
) -> Result<RankedReport> {
    if let Some(attribute) = sort_key.attribute() {
        require_attributes(&best, [attribute])?;
    }

    // NaN ranks last.
    let key = |s: &RecalculatedScore| {
        let value = match sort_key.attribute() {
            Some(name) => s.attribute(name).unwrap_or(f64::NEG_INFINITY),
            None => s.pp,
        };
        if value.is_nan() { f64::NEG_INFINITY } else { value }
    };
    best.sort_by(|a, b| key(b).total_cmp(&key(a)));

    let total_entries = best.len();
    best.truncate(top_n);
    for entry in best.iter_mut() {
        entry.map_name = truncate_name(&entry.map_name);
    }

    Ok(RankedReport {
        weighted_total: weighted_total(best.iter().map(|s| s.pp)),
        bonus: volume_bonus(total_entries),
        total_entries,
        entries: best,
    })
}

/// Checks that every entry carries each of `attributes`.
pub fn require_attributes<'a, I>(entries: &[RecalculatedScore], attributes: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for attribute in attributes {
        if let Some(entry) = entries.iter().find(|e| e.attribute(attribute).is_none()) {
            return Err(Error::MissingAttribute {
                attribute: attribute.to_owned(),
                map_name: entry.map_name.clone(),
            });
        }
    }
    Ok(())
}

/// `sum(0.95^i * pp_i)` over plays already in rank order.
pub fn weighted_total<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    ratings
        .into_iter()
        .enumerate()
        .map(|(i, pp)| DECAY_BASE.powi(i as i32) * pp)
        .sum()
}

/// Bonus for the number of beatmaps played; approaches `BONUS_CEILING`.
pub fn volume_bonus(count: usize) -> f64 {
    BONUS_CEILING * (1.0 - BONUS_BASE.powf(count as f64))
}

/// Keeps the last `MAX_NAME_LENGTH` characters of long names behind `...`.
pub fn truncate_name(name: &str) -> String {
    let len = utf8_slice::len(name);
    if len > MAX_NAME_LENGTH {
        format!("...{}", utf8_slice::from(name, len - MAX_NAME_LENGTH))
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{LegacyMods, ScoreSnapshot};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn score(checksum: &str, pp: f64, attrs: &[(&str, f64)]) -> RecalculatedScore {
        RecalculatedScore {
            checksum: checksum.into(),
            map_name: format!("map {checksum}"),
            player: "me".into(),
            timestamp: Utc::now(),
            pp,
            attributes: attrs.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
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
    fn two_map_example() {
        let report = rank(
            vec![score("c2", 80.0, &[]), score("c1", 150.0, &[])],
            &SortKey::Rating,
            500,
        )
        .unwrap();

        let order: Vec<_> = report.entries.iter().map(|e| (e.checksum.as_str(), e.pp)).collect();
        assert_eq!(order, vec![("c1", 150.0), ("c2", 80.0)]);
        assert!((report.weighted_total - 226.0).abs() < 1e-9);
        assert!((report.bonus - 0.4996).abs() < 1e-3);
        assert_eq!(report.total_entries, 2);
    }

    #[test]
    fn empty_input_has_zero_totals() {
        let report = rank(Vec::new(), &SortKey::Rating, 500).unwrap();
        assert!(report.entries.is_empty());
        assert_eq!(report.weighted_total, 0.0);
        assert_eq!(report.bonus, 0.0);
    }

    #[test]
    fn bonus_saturates_below_ceiling() {
        assert_eq!(volume_bonus(0), 0.0);
        let mut previous = 0.0;
        for n in [1, 10, 100, 1_000, 10_000] {
            let bonus = volume_bonus(n);
            assert!(bonus > previous);
            assert!(bonus < BONUS_CEILING);
            previous = bonus;
        }
    }

    #[test]
    fn truncates_to_top_n_but_bonus_counts_all() {
        let best: Vec<_> = (0..10).map(|i| score(&format!("c{i}"), i as f64, &[])).collect();
        let report = rank(best, &SortKey::Rating, 3).unwrap();

        let pps: Vec<_> = report.entries.iter().map(|e| e.pp).collect();
        assert_eq!(pps, vec![9.0, 8.0, 7.0]);
        assert_eq!(report.total_entries, 10);
        assert_eq!(report.bonus, volume_bonus(10));
        assert_eq!(report.weighted_total, weighted_total([9.0, 8.0, 7.0]));
    }

    #[test]
    fn sorts_by_attribute_but_weights_by_pp() {
        let best = vec![
            score("c1", 300.0, &[("Aim pp", 10.0)]),
            score("c2", 100.0, &[("Aim pp", 90.0)]),
        ];
        let report = rank(best, &SortKey::Attribute("Aim pp".into()), 500).unwrap();

        assert_eq!(report.entries[0].checksum, "c2");
        assert!((report.weighted_total - (100.0 + 0.95 * 300.0)).abs() < 1e-9);
    }

    #[test]
    fn missing_sort_attribute_is_fatal() {
        let best = vec![
            score("c1", 300.0, &[("Aim pp", 10.0)]),
            score("c2", 100.0, &[]),
        ];
        let err = rank(best, &SortKey::Attribute("Aim pp".into()), 500).unwrap_err();
        match err {
            Error::MissingAttribute { attribute, map_name } => {
                assert_eq!(attribute, "Aim pp");
                assert_eq!(map_name, "map c2");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn ranking_is_reproducible_with_ties() {
        let best = || {
            vec![
                score("a", 50.0, &[]),
                score("b", 50.0, &[]),
                score("c", 70.0, &[]),
            ]
        };
        let first = rank(best(), &SortKey::Rating, 500).unwrap();
        let second = rank(best(), &SortKey::Rating, 500).unwrap();
        let ids = |r: &RankedReport| r.entries.iter().map(|e| e.checksum.clone()).collect::<Vec<_>>();

        assert_eq!(ids(&first), vec!["c", "a", "b"]);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.weighted_total, second.weighted_total);
    }

    #[test]
    fn nan_ratings_sort_last() {
        let best: Vec<_> = (0..2000)
            .map(|i| {
                let pp = if i % 7 == 0 { f64::NAN } else { (i % 97) as f64 };
                score(&format!("c{i:04}"), pp, &[("Aim pp", pp)])
            })
            .collect();

        for key in [SortKey::Rating, SortKey::Attribute("Aim pp".into())] {
            let report = rank(best.clone(), &key, 2000).unwrap();
            let pps: Vec<f64> = report.entries.iter().map(|e| e.pp).collect();
            let split = pps.iter().position(|pp| pp.is_nan()).unwrap();

            assert_eq!(split, 2000 - 286);
            assert!(pps[split..].iter().all(|pp| pp.is_nan()));
            assert!(pps[..split].windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn long_names_keep_their_tail() {
        let name = format!("{}{}", "x".repeat(30), "y".repeat(MAX_NAME_LENGTH));
        let truncated = truncate_name(&name);
        assert_eq!(truncated, format!("...{}", "y".repeat(MAX_NAME_LENGTH)));
        assert_eq!(truncate_name("short"), "short");
    }
}

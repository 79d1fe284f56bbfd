mod aggregate;
mod dispatch;

pub use aggregate::{
    BONUS_BASE, BONUS_CEILING, DECAY_BASE, MAX_NAME_LENGTH, RankedReport, rank,
    require_attributes, truncate_name, volume_bonus, weighted_total,
};
pub use dispatch::{Accumulator, dispatch, work_set};

use crate::calc::PerformanceEngine;
use crate::config::RunOptions;
use crate::db::{CatalogIndex, ReplayStore};
use crate::error::{Error, Result};

/// Fails before any work is done if the run asks for an attribute the engine
/// never produces.
pub fn validate_options<E: PerformanceEngine>(engine: &E, options: &RunOptions) -> Result<()> {
    let available = engine.attribute_names();
    for attribute in options.required_attributes() {
        if !available.iter().any(|name| *name == attribute) {
            return Err(Error::UnknownAttribute {
                attribute: attribute.to_owned(),
                available: available.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    Ok(())
}

/// Recalculates every local score and ranks the best play per beatmap.
///
/// Returns `Ok(None)` when no beatmap produced a score.
pub fn prepare_report<E: PerformanceEngine>(
    index: &CatalogIndex,
    store: &ReplayStore,
    engine: &E,
    options: &RunOptions,
) -> Result<Option<RankedReport>> {
    validate_options(engine, options)?;

    let best = dispatch(index, store, engine, options)?;
    if best.is_empty() {
        return Ok(None);
    }

    require_attributes(&best, options.required_attributes())?;
    rank(best, &options.sort_key, options.top_n).map(Some)
}

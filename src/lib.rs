pub mod calc;
pub mod config;
pub mod db;
pub mod error;
pub mod ranking;
pub mod report;

pub use calc::{PerformanceEngine, PerformanceRating, RecalculatedScore, RosuEngine};
pub use config::{PlayerFilter, RunOptions, SortKey};
pub use db::{CatalogIndex, ReplayStore, load_catalog, load_replays};
pub use error::{Error, Result};
pub use ranking::{RankedReport, prepare_report};
pub use report::{export_json, render_report};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Database {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry was ranked or rendered by an attribute it does not carry.
    #[error("attribute '{attribute}' is missing for beatmap {map_name}")]
    MissingAttribute { attribute: String, map_name: String },

    /// The attribute is not produced by the scoring engine at all.
    #[error("unknown attribute '{attribute}' (available: {})", available.join(", "))]
    UnknownAttribute {
        attribute: String,
        available: Vec<String>,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to export report: {0}")]
    Export(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

use std::collections::BTreeSet;
use std::fmt;

/// How many plays count towards the weighted total.
pub const TOP_SCORES_COUNT: usize = 500;
/// How many beatmaps a test run processes.
pub const TEST_RUN_BEATMAPS: usize = 20;

/// Which local profiles are considered. An empty filter accepts everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerFilter {
    names: BTreeSet<String>,
}

impl PlayerFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, player: &str) -> bool {
        self.names.is_empty() || self.names.contains(player)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Key the ranked report is ordered by, descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Rating,
    Attribute(String),
}

impl SortKey {
    pub fn from_name(name: Option<String>) -> Self {
        name.map_or(SortKey::Rating, SortKey::Attribute)
    }

    pub fn attribute(&self) -> Option<&str> {
        match self {
            SortKey::Rating => None,
            SortKey::Attribute(name) => Some(name.as_str()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Rating => f.write_str("pp"),
            SortKey::Attribute(name) => f.write_str(name),
        }
    }
}

/// Settings for one run, captured once and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub players: PlayerFilter,
    pub extra_columns: Vec<String>,
    pub sort_key: SortKey,
    pub test_run: bool,
    pub no_chokes: bool,
    pub top_n: usize,
    /// Worker count; `None` lets rayon pick one per core.
    pub threads: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            players: PlayerFilter::default(),
            extra_columns: Vec::new(),
            sort_key: SortKey::Rating,
            test_run: false,
            no_chokes: false,
            top_n: TOP_SCORES_COUNT,
            threads: None,
        }
    }
}

impl RunOptions {
    /// Attribute names the run will look up on every ranked entry.
    pub fn required_attributes(&self) -> impl Iterator<Item = &str> {
        self.sort_key
            .attribute()
            .into_iter()
            .chain(self.extra_columns.iter().map(String::as_str))
    }
}

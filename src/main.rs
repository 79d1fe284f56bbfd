use anyhow::{Context, Result, ensure};
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;

use local_pp::config::TOP_SCORES_COUNT;
use local_pp::{
    CatalogIndex, PlayerFilter, RosuEngine, RunOptions, SortKey, export_json, load_catalog,
    load_replays, prepare_report, render_report,
};

/// Recalcs all of your local scores
#[derive(Parser, Debug)]
#[command(name = "local-pp", version, about)]
struct Cli {
    /// Path to your osu!.db file. Copy and rename it to remove the '!' in the filename if you have issues.
    osu_db: PathBuf,

    /// Path to your scores.db file.
    scores_db: PathBuf,

    /// Path to your osu Songs folder.
    songs_folder: PathBuf,

    /// Username whose scores are processed (all local players if omitted)
    username: Option<String>,

    /// Extra usernames to process
    #[arg(short = 'u', long = "user", value_name = "USERNAME")]
    users: Vec<String>,

    /// Extra columns to display from category attribs, for example 'Flashlight pp'
    #[arg(short = 'c', long = "columns", value_name = "ATTRIBUTE_NAME")]
    columns: Vec<String>,

    /// What column to sort by (defaults to pp of the play)
    #[arg(short = 's', long = "sort", value_name = "ATTRIBUTE_NAME")]
    sort: Option<String>,

    /// Only run on 20 beatmaps to test your arguments
    #[arg(long)]
    test_run: bool,

    /// Remove chokes from scores
    #[arg(long)]
    no_chokes: bool,

    /// How many plays count towards the total
    #[arg(long, default_value_t = TOP_SCORES_COUNT)]
    top: usize,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// osu! Data/r folder; replays newer than scores.db are included
    #[arg(long, value_name = "DIR")]
    replays_dir: Option<PathBuf>,

    /// Also write the ranked report as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Log every skipped replay and finished beatmap
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            players: PlayerFilter::new(self.username.iter().chain(&self.users).cloned()),
            extra_columns: self.columns.clone(),
            sort_key: SortKey::from_name(self.sort.clone()),
            test_run: self.test_run,
            no_chokes: self.no_chokes,
            top_n: self.top,
            threads: self.threads,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    ensure!(cli.osu_db.is_file(), "{} does not exist", cli.osu_db.display());
    ensure!(cli.scores_db.is_file(), "{} does not exist", cli.scores_db.display());
    ensure!(
        cli.songs_folder.is_dir(),
        "{} is not a directory",
        cli.songs_folder.display()
    );

    let options = cli.run_options();
    if !options.players.is_empty() {
        let names: Vec<_> = options.players.names().collect();
        log::info!("processing scores of {}", names.join(", "));
    }

    let catalog = load_catalog(&cli.osu_db).context("reading osu!.db")?;
    let index = CatalogIndex::build(&catalog, &cli.songs_folder);
    drop(catalog);

    let mut store = load_replays(&cli.scores_db).context("reading scores.db")?;
    if let Some(dir) = &cli.replays_dir {
        store.merge_unstored(dir);
    }

    let engine = RosuEngine::new();
    let Some(report) = prepare_report(&index, &store, &engine, &options)? else {
        println!("No replays for the selected players found!");
        return Ok(());
    };

    println!();
    print!("{}", render_report(&report, &options.extra_columns));

    if let Some(path) = &cli.json {
        export_json(&report, &options.sort_key, path)
            .with_context(|| format!("exporting report to {}", path.display()))?;
    }
    Ok(())
}

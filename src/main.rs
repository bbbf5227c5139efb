//! idxclean CLI - graphite index cleanup

use clap::Parser;
use idxclean::config::{DEFAULT_DATABASE, DEFAULT_INDEX};
use idxclean::{
    CleanConfig, ClickHouseStore, DeletionScheduler, Error, FileConfig, PatternSet, RunMode,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idxclean")]
#[command(about = "Delete graphite index entries day by day, throttled by pending mutations", long_about = None)]
struct Cli {
    /// File with one path pattern per line
    #[arg(short = 'g', long = "globs", value_name = "FILE")]
    patterns: PathBuf,

    /// Graphite index table, optionally qualified as database.table
    #[arg(long)]
    index: Option<String>,

    /// Database holding the index table
    #[arg(long)]
    database: Option<String>,

    /// Restrict dates, e.g. "Date > '2020-02-01' AND Date < '2020-03-01'"
    #[arg(long)]
    dates: Option<String>,

    /// Show the path query and exit without connecting
    #[arg(long)]
    query: bool,

    /// Also match reversed paths (if forward paths are already deleted)
    #[arg(long)]
    reverse: bool,

    /// Run delete commands instead of printing them
    #[arg(long)]
    delete: bool,

    /// Print matched paths before deleting
    #[arg(long)]
    show: bool,

    /// Ask before running delete commands
    #[arg(long)]
    ask: bool,

    /// Deletes wait while this many mutations are unfinished
    #[arg(long = "merges")]
    max_mutations: Option<usize>,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ClickHouse HTTP endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// ClickHouse user
    #[arg(long)]
    user: Option<String>,

    /// ClickHouse password
    #[arg(long, env = "CLICKHOUSE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        if let Some(hint) = err.suggestion() {
            eprintln!("hint: {}", hint);
        }
        return Err(anyhow::Error::new(err).context("index cleanup failed"));
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "idxclean=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> idxclean::Result<()> {
    // Everything that can be rejected offline is checked before the store is touched
    let date_filter = cli
        .dates
        .as_deref()
        .map(datefilter::parse)
        .transpose()
        .map_err(Error::from)?;

    let file = match &cli.config {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };

    let patterns = PatternSet::load(&cli.patterns).await?;

    let mode = if cli.query {
        RunMode::QueryOnly
    } else if cli.delete {
        RunMode::Execute
    } else {
        RunMode::DryRun
    };

    let config = CleanConfig {
        index: cli
            .index
            .or(file.index)
            .unwrap_or_else(|| DEFAULT_INDEX.to_string()),
        database: cli
            .database
            .or(file.database)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        date_filter,
        reverse: cli.reverse,
        mode,
        show_paths: cli.show,
        ask: cli.ask,
        max_mutations: cli.max_mutations.or(file.max_mutations).unwrap_or(1),
        pacing: file.pacing,
        ..CleanConfig::new(patterns)
    };
    config.validate()?;

    let mut connection = file.connection;
    if let Some(endpoint) = cli.endpoint {
        connection.endpoint = endpoint;
    }
    if cli.user.is_some() {
        connection.user = cli.user;
    }
    if cli.password.is_some() {
        connection.password = cli.password;
    }

    let store = ClickHouseStore::new(connection)?;
    let mut scheduler = DeletionScheduler::new(&config, &store, io::stdout())?;
    scheduler.run(&mut confirm_on_stdin).await?;

    Ok(())
}

fn confirm_on_stdin(prompt: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(line.trim_end_matches(&['\r', '\n'][..]) == "Y")
}

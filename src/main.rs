use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pba_stats::config::DEFAULT_DATABASE_PATH;
use pba_stats::{
    consolidate_into, ConsolidatorConfig, HistoryLookup, LabeledTable, Reconstructor,
    SqliteStore, StatFamily, TableStore,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pba-stats")]
#[command(about = "Consolidate PBA stat CSVs into SQLite and rebuild labeled views", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest every stat CSV and replace the database contents
    Consolidate {
        /// TOML config file (lowest priority after built-in defaults)
        #[arg(long, env = "PBA_CONFIG")]
        config: Option<PathBuf>,

        /// Directory of per-team player-stat CSVs
        #[arg(long, env = "PBA_PLAYER_STAT_DIR")]
        player_stat_dir: Option<PathBuf>,

        /// Directory of per-season team-stat CSVs
        #[arg(long, env = "PBA_TEAM_STAT_DIR")]
        team_stat_dir: Option<PathBuf>,

        /// Player description CSV
        #[arg(long, env = "PBA_PLAYER_DESC")]
        player_desc: Option<PathBuf>,

        /// SQLite database to replace
        #[arg(long, env = "PBA_DATABASE")]
        database: Option<PathBuf>,

        /// Fail when a team-stat file names an unknown (year, conference)
        #[arg(long, env = "PBA_STRICT_HISTORY")]
        strict_history: bool,
    },

    /// Print a labeled view of the stored tables
    Show {
        #[arg(value_enum)]
        view: View,

        #[arg(long, env = "PBA_DATABASE", default_value = DEFAULT_DATABASE_PATH)]
        database: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum View {
    TotalPlayer,
    AvgPlayer,
    TotalTeam,
    AvgTeam,
    AvgTotalPlayer,
    AvgTotalTeam,
    TotalPlayerTeam,
    AvgPlayerTeam,
    /// Average and total player-team views side by side
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    // Logs go to stderr so `show` output stays clean on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pba_stats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Consolidate {
            config,
            player_stat_dir,
            team_stat_dir,
            player_desc,
            database,
            strict_history,
        } => {
            let mut settings = ConsolidatorConfig::load(config.as_deref())?;
            if let Some(dir) = player_stat_dir {
                settings.player_stat_dir = dir;
            }
            if let Some(dir) = team_stat_dir {
                settings.team_stat_dir = dir;
            }
            if let Some(path) = player_desc {
                settings.player_desc_path = Some(path);
            }
            if let Some(path) = database {
                settings.database_path = path;
            }
            if strict_history {
                settings.history_lookup = HistoryLookup::Strict;
            }

            run_consolidate(settings)?;
        }

        Commands::Show {
            view,
            database,
            format,
            output,
        } => {
            run_show(view, database, format, output)?;
        }
    }

    Ok(())
}

fn run_consolidate(config: ConsolidatorConfig) -> Result<()> {
    println!("🏀 PBA stats consolidation");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let database_path = config.database_path.clone();
    let mut store = SqliteStore::open(&database_path)
        .with_context(|| format!("opening database {}", database_path.display()))?;
    let report = consolidate_into(config, &mut store).context("consolidation failed")?;

    println!(
        "\n📂 Files: {} player-stat, {} team-stat ({} rows read)",
        report.player_stat_files, report.team_stat_files, report.rows_read
    );
    println!(
        "🔍 Dropped: {} exact duplicates, {} duplicate keys, {} zero-minute records",
        report.exact_duplicates, report.key_duplicates, report.zero_records
    );
    println!("\n💾 {}", database_path.display());
    for (table, count) in &report.table_counts {
        println!("   {:<16} {:>6}", table, count);
    }

    let elapsed = report.finished_at - report.started_at;
    println!("\n✓ Done in {} ms", elapsed.num_milliseconds());
    Ok(())
}

fn run_show(
    view: View,
    database: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    if !database.exists() {
        bail!(
            "database {} not found; run `pba-stats consolidate` first",
            database.display()
        );
    }

    let store = SqliteStore::open(&database)?;
    let tables = store.load_all()?;
    let reconstructor = Reconstructor::new(&tables);
    let table = build_view(&reconstructor, view);

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    write_table(&table, format, writer)?;
    Ok(())
}

fn build_view(reconstructor: &Reconstructor<'_>, view: View) -> LabeledTable {
    match view {
        View::TotalPlayer => reconstructor.total_player(),
        View::AvgPlayer => reconstructor.avg_player(),
        View::TotalTeam => reconstructor.total_team(),
        View::AvgTeam => reconstructor.avg_team(),
        View::AvgTotalPlayer => reconstructor.avg_total_player(),
        View::AvgTotalTeam => reconstructor.avg_total_team(),
        View::TotalPlayerTeam => reconstructor.player_team(StatFamily::Total),
        View::AvgPlayerTeam => reconstructor.player_team(StatFamily::Average),
        View::All => reconstructor.full_join(),
    }
}

fn write_table(table: &LabeledTable, format: OutputFormat, mut writer: Box<dyn Write>) -> Result<()> {
    match format {
        OutputFormat::Csv => table.write_csv(writer)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &table.to_json())?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

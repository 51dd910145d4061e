//! strata-migrate CLI
//!
//! Applies and reverts the SQL migrations found in a directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use strata_db::{Connection, ConnectionConfig, DatabaseConfig};
use strata_migrate::{
    MigrateOptions, MigrationRepository, MigrationSet, Migrator, Note, RollbackOptions,
};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

/// Batch-tracked database migrations.
#[derive(Parser)]
#[command(name = "strata-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Migrations directory.
    #[arg(short, long, default_value = "migrations")]
    path: PathBuf,

    /// Table-name prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// Ledger table name.
    #[arg(long, default_value = strata_migrate::DEFAULT_TABLE)]
    table: String,

    /// TOML file with named connections. Overrides `--database`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connection to use from the config file.
    #[arg(long, requires = "config")]
    connection: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations.
    Migrate {
        /// Give every migration its own batch.
        #[arg(long)]
        step: bool,

        /// Print the SQL without running it.
        #[arg(long)]
        pretend: bool,
    },

    /// Revert the last batch.
    Rollback {
        /// Number of batches to revert.
        #[arg(long)]
        step: Option<u64>,

        /// Print the SQL without running it.
        #[arg(long)]
        pretend: bool,
    },

    /// Revert every migration, then migrate again.
    Refresh {
        /// Print the SQL without running it.
        #[arg(long)]
        pretend: bool,
    },

    /// Revert every migration.
    Reset {
        /// Print the SQL without running it.
        #[arg(long)]
        pretend: bool,
    },

    /// Show which migrations have run.
    Status,
}

fn connect(cli: &Cli) -> anyhow::Result<Connection> {
    let (name, mut config) = match &cli.config {
        Some(path) => {
            let file = DatabaseConfig::load(path)?;
            let config = file.connection(cli.connection.as_deref())?.clone();
            let name = cli.connection.clone().unwrap_or(file.default);
            (name, config)
        }
        None => (String::from("default"), ConnectionConfig::from_url(&cli.database)),
    };
    if let Some(prefix) = &cli.prefix {
        config.prefix.clone_from(prefix);
    }
    debug!(connection = %name, url = %config.url, "Connecting");
    config
        .connect(&name)
        .with_context(|| format!("Failed to open connection [{name}]"))
}

fn print_notes(notes: &[Note]) {
    for note in notes {
        println!("{note}");
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (set, missing_dir) = MigrationSet::discover(&cli.path)?;
    if let Some(note) = missing_dir {
        println!("{note}");
    }
    let mut conn = connect(&cli)?;
    let migrator = Migrator::new(&set, MigrationRepository::new(&cli.table));

    match cli.command {
        Commands::Migrate { step, pretend } => {
            print_notes(&migrator.migrate(&mut conn, MigrateOptions { step, pretend })?);
        }

        Commands::Rollback { step, pretend } => {
            let options = RollbackOptions {
                steps: step,
                pretend,
            };
            print_notes(&migrator.rollback(&mut conn, options)?);
        }

        Commands::Refresh { pretend } => {
            print_notes(&migrator.refresh(&mut conn, pretend)?);
        }

        Commands::Reset { pretend } => {
            print_notes(&migrator.reset(&mut conn, pretend)?);
        }

        Commands::Status => {
            let report = migrator.status(&mut conn)?;
            print_notes(&report.notes);
            if report.migrations.is_empty() {
                println!("No migrations found.");
            } else {
                let width = report
                    .migrations
                    .iter()
                    .map(|m| m.name.len())
                    .max()
                    .unwrap_or(0);
                for migration in &report.migrations {
                    println!("{:<width$}  {}", migration.name, migration.state);
                }
            }
        }
    }

    Ok(())
}

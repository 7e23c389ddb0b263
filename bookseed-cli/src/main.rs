//! bookseed CLI - provision the catalogue database
//!
//! Reads DB_USER, DB_PASSWORD, DB_HOST, DB_PORT and DB_NAME (optionally
//! from a `.env` file), creates the catalogue tables, inserts the fixed
//! rows and prints one table.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bookseed_core::{
    load_dotenv, DbConfig, OutputFormat, Provisioner, SeedSet, Table, TransactionMode,
};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "bookseed",
    author,
    version,
    about = "Create and seed the publishers/authors/books catalogue in a MySQL database",
    long_about = "Creates the publishers, authors, books and book_authors tables in an empty \
                  MySQL database, inserts the fixed catalogue rows, then prints one table. \
                  Connection settings come from DB_USER, DB_PASSWORD, DB_HOST, DB_PORT and \
                  DB_NAME, optionally loaded from a .env file."
)]
struct Cli {
    /// Load connection variables from this file instead of the nearest .env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Insert all rows in one transaction, rolled back on any failure
    #[arg(long)]
    atomic_seed: bool,

    /// Table to print after seeding
    #[arg(long, value_enum, default_value_t = ShowTable::Authors)]
    show: ShowTable,

    /// Output format for the printed table
    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    format: FormatArg,

    /// Enable debug logging
    #[arg(long, env = "BOOKSEED_DEBUG")]
    debug: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ShowTable {
    Publishers,
    Authors,
    Books,
    BookAuthors,
}

impl From<ShowTable> for Table {
    fn from(value: ShowTable) -> Self {
        match value {
            ShowTable::Publishers => Table::Publishers,
            ShowTable::Authors => Table::Authors,
            ShowTable::Books => Table::Books,
            ShowTable::BookAuthors => Table::BookAuthors,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FormatArg {
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    if let Err(err) = run(cli).await {
        error!("provisioning aborted");
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    load_dotenv(cli.env_file.as_deref())?;
    let config = DbConfig::from_env().context("invalid database configuration")?;

    let seed = SeedSet::catalogue();
    let issues = seed.check_references();
    if !issues.is_empty() {
        for issue in &issues {
            error!(table = %issue.table, "{}", issue.detail);
        }
        bail!("seed data has {} unresolved references", issues.len());
    }

    let mode = if cli.atomic_seed {
        TransactionMode::AtomicSeed
    } else {
        TransactionMode::AutoCommit
    };

    let mut provisioner = Provisioner::connect(&config).await?.with_mode(mode);
    info!(target_db = %config, mode = ?provisioner.mode(), "provisioning");
    let frame = provisioner.run(&seed, cli.show.into()).await?;
    provisioner.close().await?;

    let rendered = frame
        .render(cli.format.into())
        .context("failed to render result")?;
    println!("{}", rendered);

    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reconsider_config::FileFormat;

mod commands;
mod utils;
use commands::{cmd_down, cmd_init, cmd_new, cmd_schema, cmd_status, cmd_up};

/// reconsider command-line interface.
#[derive(Parser, Debug)]
#[command(name = "reconsider", author, version, about)]
struct Cli {
    /// JSON file holding the database state.
    #[arg(long, global = true, default_value = utils::DEFAULT_STORE)]
    store: PathBuf,
    /// Log every step, including skipped ones.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize reconsider.json and the migrations directory.
    Init {
        /// Name of the database to migrate.
        #[arg(long)]
        db: Option<String>,
    },
    /// Create a new, empty migration file.
    New {
        #[arg(short = 'm', long = "message")]
        message: String,
        /// Overrides the configured migration format.
        #[arg(short = 'f', long = "format", value_enum)]
        format: Option<FileFormat>,
    },
    /// List migrations and whether they have completed.
    Status,
    /// Apply pending migrations.
    Up {
        /// Migration id to skip; repeatable.
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
    },
    /// Revert completed migrations, most recent first.
    Down {
        /// Migration id to skip; repeatable.
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
    },
    /// Write JSON Schemas for migration files and the config.
    Schema {
        #[arg(short = 'o', long = "out", default_value = "schemas")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose);
    match cli.command {
        Commands::Init { db } => cmd_init(db),
        Commands::New { message, format } => cmd_new(message, format).await,
        Commands::Status => cmd_status(&cli.store).await,
        Commands::Up { exclude } => cmd_up(&cli.store, exclude).await,
        Commands::Down { exclude } => cmd_down(&cli.store, exclude).await,
        Commands::Schema { out } => cmd_schema(out),
    }
}

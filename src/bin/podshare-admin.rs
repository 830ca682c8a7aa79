//! podshare maintenance CLI
//!
//! Operates directly on the data directory resolved from the same
//! configuration the server loads.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use podshare::config::AppConfig;
use podshare::data::Database;
use podshare::error::AppError;
use podshare::maintenance;

#[derive(Debug, Parser)]
#[command(name = "podshare-admin")]
#[command(about = "Maintenance and diagnostics for podshare", long_about = None)]
struct Cli {
    /// Override the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "create the data directory, uploads directory and database")]
    Init,
    #[command(about = "copy the database and uploads to a backup directory")]
    Backup {
        #[arg(long, default_value = "./backup")]
        backup_dir: PathBuf,
    },
    #[command(about = "copy the database and uploads back from a backup directory")]
    Restore {
        #[arg(long, default_value = "./backup")]
        backup_dir: PathBuf,
    },
    #[command(about = "write every podcast row to a JSON document")]
    ExportRows {
        /// Defaults to podcasts-backup.json in the data directory
        #[arg(long)]
        file: Option<PathBuf>,
    },
    #[command(about = "replace all podcast rows with those in a JSON document")]
    ImportRows {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    #[command(about = "move a top-level podcast.db and uploads/ into the data directory")]
    Migrate {
        #[arg(long, default_value = ".")]
        legacy_root: PathBuf,
    },
    #[command(about = "print the resolved configuration without secrets")]
    Diagnose,
    #[command(about = "check connectivity to the object storage bucket")]
    StorageCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Failed to load configuration: {}", error);
            return ExitCode::FAILURE;
        }
    };
    podshare::init_tracing(&config.logging);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(dir) = cli.data_dir {
        config.data.dir = Some(dir);
    }
    let paths = config.data_paths();

    match cli.command {
        Commands::Init => {
            let report = maintenance::init_data(&paths).await?;
            println!(
                "{} {}",
                paths.db_path.display(),
                if report.created { "created" } else { "already exists" }
            );
        }
        Commands::Backup { backup_dir } => {
            let report = maintenance::backup_files(&paths, &backup_dir).await?;
            println!(
                "backed up to {} (database: {}, audio files: {})",
                report.backup_dir.display(),
                report.database_copied,
                report.files_copied
            );
        }
        Commands::Restore { backup_dir } => {
            let report = maintenance::restore_files(&paths, &backup_dir).await?;
            println!(
                "restored (database: {}, audio files: {})",
                report.database_restored, report.files_restored
            );
        }
        Commands::ExportRows { file } => {
            let file = file.unwrap_or_else(|| paths.rows_backup_path.clone());
            let db = Database::connect(&paths.db_path).await?;
            let result = maintenance::export_rows(&db, &file).await;
            db.close().await;
            println!("exported {} rows to {}", result?, file.display());
        }
        Commands::ImportRows { file } => {
            let file = file.unwrap_or_else(|| paths.rows_backup_path.clone());
            let db = Database::connect(&paths.db_path).await?;
            let result = maintenance::import_rows(&db, &file).await;
            db.close().await;
            let report = result?;
            match report.backup_timestamp {
                Some(timestamp) => println!(
                    "restored {} rows, {} failed (backup from {})",
                    report.restored, report.failed, timestamp
                ),
                None => println!("no backup found at {}", file.display()),
            }
        }
        Commands::Migrate { legacy_root } => {
            let report = maintenance::migrate_legacy_layout(&legacy_root, &paths).await?;
            if report.is_empty() {
                println!("nothing to migrate");
            } else {
                println!(
                    "migrated (database: {}, audio files: {})",
                    report.database_copied, report.files_copied
                );
            }
        }
        Commands::Diagnose => {
            println!("{}", maintenance::diagnose(&config));
        }
        Commands::StorageCheck => {
            let check = maintenance::check_object_storage(&config).await?;
            print!("{}", check);
        }
    }

    Ok(())
}

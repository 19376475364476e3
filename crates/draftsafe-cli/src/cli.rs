use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "draftsafe")]
#[command(about = "Inspect draft backups and run recovery checks and saves")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the local backup database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage local draft backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Check whether a local backup should be offered over the remote copy
    Recover {
        /// Document ID
        id: String,
        /// Remote document update time (nanoseconds since the epoch)
        #[arg(long, value_name = "TIME", allow_negative_numbers = true)]
        remote_updated_at: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Delete the backup after reporting on it
        #[arg(long)]
        discard: bool,
    },
    /// Save a document once through the auto-save scheduler
    Save {
        /// Document ID
        id: String,
        /// Version token the remote copy is expected to have
        #[arg(long, value_name = "TOKEN", allow_negative_numbers = true)]
        version_token: i64,
        /// Read content from a file (stdin when omitted)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Show or initialize CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// List stored backups, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the backup for a document
    Show {
        /// Document ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a backup for a document
    Write {
        /// Document ID
        id: String,
        /// Read content from a file (stdin when omitted)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Remove the backup for a document
    Clear {
        /// Document ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create or update the config file
    Init {
        /// Document API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Local backup database path
        #[arg(long, value_name = "PATH")]
        backup_db_path: Option<PathBuf>,
    },
}

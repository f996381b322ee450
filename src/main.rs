//! gridspool CLI.
//!
//! Entry point for the `gridspool` command-line tool. The live submission
//! surface (REST transport, credentials) is wired up by the deployment; the
//! CLI here covers the local operations: description validation and
//! configuration checking.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use gridspool::config::ClientConfig;
use gridspool_desc::{parse, unparse_batch};

#[derive(Parser)]
#[command(name = "gridspool")]
#[command(about = "Batch job submission client for a remote job-pool service", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse job description files and report problems
    Validate {
        /// Description files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the canonical serialized form of each valid file
        #[arg(long)]
        normalize: bool,
    },

    /// Load a client configuration file and echo the effective settings
    Config {
        /// Path to the configuration file
        path: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { files, normalize } => run_validate(&files, normalize),
        Commands::Config { path } => run_config(&path),
    }
}

fn run_validate(files: &[PathBuf], normalize: bool) {
    let mut failures = 0;
    for file in files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("{}: {err}", file.display());
                failures += 1;
                continue;
            }
        };
        match parse(&text) {
            Ok(descriptions) => {
                println!("{}: {} job description(s)", file.display(), descriptions.len());
                if normalize {
                    if let Some(canonical) = unparse_batch(&descriptions) {
                        println!("{canonical}");
                    }
                }
            }
            Err(err) => {
                eprintln!("{}: {err}", file.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        process::exit(1);
    }
}

fn run_config(path: &Path) {
    match ClientConfig::from_file(path) {
        Ok(config) => {
            println!("Configuration valid: {}", path.display());
            println!();
            println!("  Server: {}", config.server);
            if let Some(ref token) = config.token {
                println!("  Token file: {}", token.display());
            }
            if let Some(ref webdav) = config.webdav {
                println!("  WebDAV store: {webdav}");
            }
            if !config.clusters.is_empty() {
                let mut names: Vec<&str> = config.clusters.keys().map(String::as_str).collect();
                names.sort_unstable();
                println!("  Cluster lists: {}", names.join(", "));
            }
            println!("  Batch size: {}", config.batch_size);
        }
        Err(err) => {
            eprintln!("Configuration error: {err}");
            process::exit(1);
        }
    }
}

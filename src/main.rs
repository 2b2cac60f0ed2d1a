//! Semantic Manifest CLI
//!
//! Entry point for the `semantic-manifest` command-line tool.

use clap::{Parser, Subcommand};
use semantic_manifest::pipeline::Reparser;
use semantic_manifest::{clean, logging, Error, Manifest, ProjectConfig};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "semantic-manifest")]
#[command(about = "Resolve semantic models, metrics and groups into a manifest", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the project and build the manifest
    Parse {
        /// Project root containing project.toml
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Write the manifest JSON to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Keep running and re-parse whenever inputs change
        #[arg(long)]
        watch: bool,

        /// Poll interval for --watch, in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval: u64,
    },

    /// Remove the project's clean targets
    Clean {
        /// Project root containing project.toml
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// List what would be removed without removing it
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            project_dir,
            output,
            watch,
            interval,
        } => {
            if watch {
                watch_project(&project_dir, output.as_deref(), Duration::from_millis(interval))
            } else {
                parse_once(&project_dir, output.as_deref())
            }
        }
        Commands::Clean {
            project_dir,
            dry_run,
        } => clean_project(&project_dir, dry_run),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn emit(manifest: &Manifest, output: Option<&Path>) -> Result<(), Error> {
    match output {
        Some(path) => {
            manifest.write_to_file(path)?;
            info!(path = %path.display(), "wrote manifest");
        }
        None => println!("{}", manifest.to_json()?),
    }
    Ok(())
}

fn parse_once(project_dir: &Path, output: Option<&Path>) -> Result<(), Error> {
    let mut reparser = Reparser::new(project_dir);
    let manifest = reparser.reparse()?;
    emit(&manifest, output)
}

fn watch_project(project_dir: &Path, output: Option<&Path>, interval: Duration) -> Result<(), Error> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let mut reparser = Reparser::new(project_dir);
    // The first pass must succeed; later failures keep the last manifest.
    let manifest = reparser.reparse()?;
    emit(&manifest, output)?;

    // Snapshot load errors carry no fingerprint; repeat them only when they change.
    let mut last_error: Option<String> = None;
    while running.load(Ordering::SeqCst) {
        thread::sleep(interval);
        match reparser.reparse_if_changed() {
            Ok(Some(manifest)) => {
                last_error = None;
                emit(&manifest, output)?;
            }
            Ok(None) => last_error = None,
            Err(e) => {
                let message = e.to_string();
                if last_error.as_deref() != Some(message.as_str()) {
                    warn!(error = %message, "re-parse failed, keeping previous manifest");
                    last_error = Some(message);
                }
            }
        }
    }
    info!("stopped watching");
    Ok(())
}

fn clean_project(project_dir: &Path, dry_run: bool) -> Result<(), Error> {
    let project = ProjectConfig::load(project_dir)?;
    let removed = clean::clean(project_dir, &project, dry_run)?;
    for path in removed {
        if dry_run {
            println!("would remove {}", path.display());
        } else {
            println!("removed {}", path.display());
        }
    }
    Ok(())
}

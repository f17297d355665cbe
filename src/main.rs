//! Kage CLI - inspect and validate Kage node projects

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use kage::{FixSuggestion, KageError, KageNode};

#[derive(Parser)]
#[command(name = "kage")]
#[command(about = "Kage - schema-driven function orchestration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a node project
    Validate {
        /// Node project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print node information as JSON
    Info {
        /// Node project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    kage::cli::init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { dir } => validate_node(&dir),
        Commands::Info { dir } => show_info(&dir),
        Commands::Version => {
            println!("kage {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn validate_node(dir: &Path) -> Result<bool, KageError> {
    let node = KageNode::load(dir)?;

    if !node.is_valid() {
        eprintln!(
            "{} Invalid Kage node '{}' in {}",
            "✗".red(),
            node.name(),
            dir.display()
        );
        eprintln!(
            "  Entry file: {} | type: {} | language: {}",
            node.manifest().model.entry_file,
            node.manifest().node_type,
            node.manifest().model.execution_model.language
        );
        return Ok(false);
    }

    println!("{} Kage node is valid", "✓".green());
    println!("  Name: {}", node.name());
    println!("  Version: {}", node.version());
    if !node.description().is_empty() {
        println!("  Description: {}", node.description());
    }
    Ok(true)
}

fn show_info(dir: &Path) -> Result<bool, KageError> {
    let node = KageNode::load(dir)?;
    println!("{}", serde_json::to_string_pretty(&node.info())?);
    Ok(true)
}

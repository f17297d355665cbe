//! Node command-line entry point
//!
//! A node binary hands its argument parsing and error reporting to
//! [`node_main`] and only supplies the function that binds operations:
//!
//! ```no_run
//! use kage::{operation, FunctionBinding};
//! use serde_json::json;
//!
//! fn main() -> std::process::ExitCode {
//!     kage::cli::node_main(|mut kage| {
//!         kage.bind(
//!             FunctionBinding::new(operation("double", ["x"], |args| {
//!                 Ok(json!(args.parse::<i64>("x")? * 2))
//!             }))
//!             .input("x", "n")
//!             .output("result.value"),
//!         )?;
//!         Ok(kage)
//!     })
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::engine::{write_json, Kage};
use crate::error::{FixSuggestion, KageError, Result};
use crate::node::KageNode;
use crate::source::read_json_file;

/// Options accepted by every node binary
#[derive(Parser, Debug, Clone)]
#[command(about = "Execute a Kage node")]
pub struct NodeArgs {
    /// Path to input JSON file
    #[arg(long, required_unless_present_any = ["info", "validate_only"])]
    pub input: Option<PathBuf>,

    /// Path to output JSON file
    #[arg(long = "output-json", required_unless_present_any = ["info", "validate_only"])]
    pub output_json: Option<PathBuf>,

    /// Directory holding the node manifest; relative paths resolve against it
    #[arg(long = "working-dir")]
    pub working_dir: Option<PathBuf>,

    /// Only validate the node, don't execute
    #[arg(long = "validate-only")]
    pub validate_only: bool,

    /// Print node information as JSON
    #[arg(long)]
    pub info: bool,
}

impl NodeArgs {
    fn project_dir(&self) -> PathBuf {
        self.working_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Install the stderr log subscriber (`RUST_LOG`, default `warn`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed by the host binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse process arguments and run the node
pub fn node_main<F>(configure: F) -> ExitCode
where
    F: FnOnce(Kage) -> Result<Kage>,
{
    init_tracing();
    let args = NodeArgs::parse();
    ExitCode::from(run_node(&args, configure))
}

/// Run a node with parsed arguments, returning the process exit status
///
/// Once the output path is known, every failure is also written to it as
/// `{"error": "<message>"}`.
pub fn run_node<F>(args: &NodeArgs, configure: F) -> u8
where
    F: FnOnce(Kage) -> Result<Kage>,
{
    match execute_node(args, configure) {
        Ok(status) => status,
        Err(e) => {
            report_error(&e);
            if let Some(output) = &args.output_json {
                let output = args.resolve(output);
                if let Err(write_err) = write_json(&output, &e.to_payload()) {
                    eprintln!(
                        "{} failed to write error payload to {}: {}",
                        "Error:".red().bold(),
                        output.display(),
                        write_err
                    );
                }
            }
            1
        }
    }
}

fn execute_node<F>(args: &NodeArgs, configure: F) -> Result<u8>
where
    F: FnOnce(Kage) -> Result<Kage>,
{
    let node = KageNode::load(args.project_dir())?;

    if args.info {
        println!("{}", serde_json::to_string_pretty(&node.info())?);
        return Ok(0);
    }

    if !node.is_valid() {
        eprintln!("{} Invalid Kage node", "✗".red());
        return Ok(1);
    }
    println!(
        "{} Valid Kage node: {} v{}",
        "✓".green(),
        node.name(),
        node.version()
    );

    if args.validate_only {
        println!("{} Node validation passed", "✓".green());
        return Ok(0);
    }

    let (input_path, output_path) = match (&args.input, &args.output_json) {
        (Some(input), Some(output)) => (args.resolve(input), args.resolve(output)),
        _ => {
            return Err(KageError::InvalidSource {
                source_text: "--input and --output-json are required to execute".into(),
            })
        }
    };

    let input = read_json_file(&input_path)?;
    info!(input = %input_path.display(), "Loaded input data");

    let mut kage = configure(node.initialize()?)?;
    debug!(?kage, "Configured engine");

    println!("{} Executing Kage node...", "→".cyan());
    let output = kage.execute(input)?;

    write_json(&output_path, &output)?;
    println!(
        "{} Output saved to {}",
        "✓".green(),
        output_path.display()
    );
    Ok(0)
}

fn report_error(e: &KageError) {
    eprintln!("{} {} {}", "Error:".red().bold(), e.kind(), e);
    if let Some(suggestion) = e.fix_suggestion() {
        eprintln!("  {} {}", "Fix:".yellow(), suggestion);
    }
}

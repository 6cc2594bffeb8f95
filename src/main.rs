//! Vespa Trace Convert CLI
//!
//! Converts Vespa query execution traces into Jaeger-compatible trace
//! documents ready for import into standard trace-visualization tools.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use vespa_trace_convert::commands::{execute_convert, validate_args, ConvertArgs};
use vespa_trace_convert::output::read_export;

/// Vespa Trace Convert - Vespa query traces as Jaeger documents
#[derive(Parser, Debug)]
#[command(name = "vespa-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a raw trace file to a Jaeger export file
    Convert {
        /// Path to the raw trace JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the converted document
        #[arg(short, long, default_value = "trace.json")]
        output: PathBuf,

        /// Write compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,

        /// Print a text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a converted trace file
    Validate {
        /// Path to the converted JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display output schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            compact,
            summary,
        } => {
            let args = ConvertArgs {
                input,
                output,
                compact,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_convert(args)?;
        }

        Commands::Validate { file } => {
            validate_trace_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate a converted trace file against the document invariants
fn validate_trace_file(file_path: PathBuf) -> Result<()> {
    println!("Validating trace: {}", file_path.display());

    let document = read_export(&file_path)?;
    let errors = document.integrity_errors();

    if !errors.is_empty() {
        for error in &errors {
            eprintln!("  ✗ {}", error);
        }
        anyhow::bail!("{} integrity violations found", errors.len());
    }

    println!("✓ Valid trace document");
    println!("  Trace ID:  {}", document.trace_id);
    println!("  Spans:     {}", document.spans.len());
    println!("  Processes: {}", document.processes.len());

    Ok(())
}

/// Display output schema information
fn display_schema(show_details: bool) {
    println!("Vespa Trace Convert Output Schema (Jaeger-compatible)");
    println!();

    if show_details {
        println!("Document Structure:");
        println!("  traceID: string            - 32-hex trace identifier");
        println!("  spans: array               - Flat span list, emission order");
        println!("    traceID: string          - Matches the document traceID");
        println!("    spanID: string           - 16-hex span identifier, unique");
        println!("    operationName: string    - Raw trace message text");
        println!("    startTime: number        - Microseconds, absolute when anchored");
        println!("    duration: number         - Microseconds, always >= 1");
        println!("    references: array        - Zero or one CHILD_OF edge");
        println!("    tags: array              - Always empty");
        println!("    logs: array              - Always empty");
        println!("    processID: string        - Key into the processes map");
        println!("  processes: object          - processID -> process");
        println!("    serviceName: string      - Derived service name");
        println!("    tags: array              - Always empty");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
fn display_version() {
    println!("Vespa Trace Convert v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Converts Vespa query execution traces into Jaeger trace documents.");
}

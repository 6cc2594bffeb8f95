//! Convert command implementation.
//!
//! The convert command:
//! 1. Reads the raw trace JSON file
//! 2. Runs the conversion
//! 3. Writes the Jaeger export file
//! 4. Optionally prints a summary

use crate::convert::convert_trace;
use crate::output::write_export;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the convert command
#[derive(Debug, Clone)]
pub struct ConvertArgs {
    /// Path to the raw trace JSON file
    pub input: PathBuf,

    /// Output path for the converted document
    pub output: PathBuf,

    /// Write compact JSON instead of pretty-printed
    pub compact: bool,

    /// Print a text summary to stdout
    pub print_summary: bool,
}

/// Validate convert arguments before doing any work
pub fn validate_args(args: &ConvertArgs) -> Result<()> {
    if !args.input.exists() {
        bail!("Input file does not exist: {}", args.input.display());
    }
    if args.output.as_os_str().is_empty() {
        bail!("Output path is empty");
    }
    Ok(())
}

/// Execute the convert command
///
/// # Errors
/// * Input file read or JSON parse failures
/// * Conversion failures (no timed work, missing preamble)
/// * Output write failures
pub fn execute_convert(args: ConvertArgs) -> Result<()> {
    let started = Instant::now();

    info!("Converting trace: {}", args.input.display());

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .context("Input is not valid JSON")?;

    let document = convert_trace(&raw).context("Failed to convert trace")?;

    debug!(
        "Converted {} spans across {} processes",
        document.spans.len(),
        document.processes.len()
    );

    if args.print_summary {
        println!("Trace ID:  {}", document.trace_id);
        println!("Spans:     {}", document.spans.len());
        println!("Processes: {}", document.processes.len());
    }

    write_export(document, &args.output, args.compact)
        .context("Failed to write converted trace")?;

    info!(
        "Conversion finished in {:?}, output: {}",
        started.elapsed(),
        args.output.display()
    );

    Ok(())
}

//! JSON file writer/reader for converted trace documents.
//!
//! The on-disk format is the Jaeger UI import shape: the document wrapped
//! in a `{"data": [...]}` envelope.

use crate::convert::{JaegerExport, TraceDocument};
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a converted document to a JSON file.
///
/// Wraps the document in the export envelope, creates parent directories
/// as needed, pretty-prints unless `compact` is set.
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - path cannot be created or is invalid
pub fn write_export(
    document: TraceDocument,
    output_path: impl AsRef<Path>,
    compact: bool,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing trace document to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let export = JaegerExport {
        data: vec![document],
    };

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    if compact {
        serde_json::to_writer(writer, &export).map_err(OutputError::SerializationFailed)?;
    } else {
        serde_json::to_writer_pretty(writer, &export)
            .map_err(OutputError::SerializationFailed)?;
    }

    Ok(())
}

/// Read a converted document back from a JSON file.
///
/// # Errors
/// * `OutputError::WriteFailed` - file read error
/// * `OutputError::SerializationFailed` - JSON parse error
/// * `OutputError::EmptyExport` - the envelope holds no documents
pub fn read_export(input_path: impl AsRef<Path>) -> Result<TraceDocument, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading trace document from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let export: JaegerExport =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    export.data.into_iter().next().ok_or(OutputError::EmptyExport)
}

/// Validate that the output path is usable
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

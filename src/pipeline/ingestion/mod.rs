// Ingestion: loading the raw input file into memory

use std::fs;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::observability::metrics;

/// A non-blank line of the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the file
    pub number: usize,
    pub text: String,
}

/// Read the whole input file into memory.
///
/// The file is decoded as UTF-8, falling back to Latin-1 for legacy exports.
/// The only failure is an unreadable file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_sales_data(path: &Path, has_header: bool) -> Result<Vec<SourceLine>> {
    let bytes = fs::read(path).map_err(|source| PipelineError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    let content = decode(&bytes);
    let lines = split_lines(&content, has_header);
    info!("Read {} lines from {}", lines.len(), path.display());
    metrics::ingest::lines_read(lines.len());
    Ok(lines)
}

/// Decode file bytes as UTF-8 (BOM stripped), or Latin-1 when not valid UTF-8
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!("Input is not valid UTF-8; decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Split decoded content into numbered lines, dropping the header and blank lines
pub fn split_lines(content: &str, has_header: bool) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .skip(usize::from(has_header))
        .filter_map(|(index, line)| {
            let text = line.trim();
            if text.is_empty() {
                None
            } else {
                Some(SourceLine {
                    number: index + 1,
                    text: text.to_string(),
                })
            }
        })
        .collect()
}

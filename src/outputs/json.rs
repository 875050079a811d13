//! JSON output of translated news.
//!
//! The document is pretty-printed with four-space indentation and written as
//! UTF-8 with non-ASCII characters left unescaped. Each run replaces the
//! previous file; results are never merged across runs.

use crate::models::{OutputDocument, TranslationResult};
use crate::utils::now_timestamp;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `value` with four-space indentation.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write `results`, stamped with the current local time, to `path`.
///
/// Overwrites any existing file. Filesystem errors are returned as-is.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = results.len()))]
pub async fn write_document(
    results: Vec<TranslationResult>,
    path: &Path,
) -> Result<OutputDocument, Box<dyn Error>> {
    let document = OutputDocument {
        timestamp: now_timestamp(),
        all_news: results,
    };
    let json = to_pretty_json(&document)?;

    fs::write(path, json).await?;
    info!("JSON saved");
    Ok(document)
}

/// Read a previously written document.
#[cfg(test)]
pub async fn read_document(path: &Path) -> Result<OutputDocument, Box<dyn Error>> {
    let raw = fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

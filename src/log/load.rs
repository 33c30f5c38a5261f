//! Loaders: turn files into row vectors, applying a caller-supplied
//! canonicalizer per record.
//!
//! JSONL files are read line by line so peak memory is bounded by one event
//! plus the canonical rows, regardless of log size. Malformed JSON is fatal
//! and reported with path and line number.

use crate::Result;
use crate::log::LogEvent;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Stream a JSONL event log, keeping `canonicalize`'s `Some` rows.
///
/// The canonicalizer returns `Ok(None)` to skip records that do not match
/// its target predicate, and errors only for matching records that violate
/// the expected schema.
pub fn load_jsonl<T, F>(path: &Path, mut canonicalize: F) -> Result<Vec<T>>
where
    F: FnMut(&LogEvent) -> Result<Option<T>>,
{
    let file = File::open(path).with_context(|| format!("open log file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let lno = lineno + 1;
        let line = line.with_context(|| format!("read {}:{}", path.display(), lno))?;
        if line.trim().is_empty() {
            continue;
        }

        let event: LogEvent = serde_json::from_str(&line)
            .with_context(|| format!("malformed event at {}:{}", path.display(), lno))?;

        if let Some(row) = canonicalize(&event)
            .with_context(|| format!("bad event at {}:{}", path.display(), lno))?
        {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Load a batch JSON dump: one file holding an array of records.
pub fn load_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read dump file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed dump {}", path.display()))
}

/// Load every `.json` file in a directory as one concatenated record list.
pub fn load_json_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("read dump directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        records.extend(load_json_array(&path)?);
    }
    Ok(records)
}

//! Row canonicalization: map raw log events to flat typed samples, dropping
//! events that do not match the target message.
//!
//! Each canonicalizer mirrors one family of analysis scripts: it returns
//! `None` for unrelated events and errors only when a matching event
//! violates its schema.

use crate::Result;
use crate::log::LogEvent;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

const EXECUTION_FINISHED: &str = "contract execution finished";
const COMPILATION_FINISHED: &str = "contract compilation finished";
const CACHING_SPAN: &str = "caching block range";
const COMPILATION_SPAN: &str = "contract compilation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Executor {
    Native,
    Vm,
}

/// One finished contract execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSample {
    pub class_hash: String,
    /// Execution wall time in nanoseconds.
    pub time: f64,
}

/// One finished contract compilation (native shared library or casm).
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationSample {
    pub class_hash: String,
    pub executor: Executor,
    /// Compilation wall time in milliseconds.
    pub time_ms: f64,
    /// Compiled output size in KiB.
    pub size_kib: f64,
    /// Sierra program size in KiB.
    pub length_kib: f64,
}

/// Keep "contract execution finished" events, skipping anything inside a
/// cache-warming span.
pub fn execution_sample(event: &LogEvent) -> Result<Option<ExecutionSample>> {
    if event.find_span(CACHING_SPAN).is_some() {
        return Ok(None);
    }
    if !event.fields.message.contains(EXECUTION_FINISHED) {
        return Ok(None);
    }

    let span = event
        .innermost_span()
        .context("execution event carries no span")?;
    let class_hash = span
        .string("class_hash")
        .context("execution span missing class_hash")?;
    let time = event
        .fields
        .number("time")
        .context("execution event missing time field")?;

    Ok(Some(ExecutionSample {
        class_hash: normalize_hash(&class_hash)?,
        time,
    }))
}

/// Keep "contract compilation finished" events that carry a compilation
/// span, tagging each with the executor named in the message.
pub fn compilation_sample(event: &LogEvent) -> Result<Option<CompilationSample>> {
    let message = &event.fields.message;
    if !message.contains(COMPILATION_FINISHED) {
        return Ok(None);
    }
    let Some(span) = event.find_span(COMPILATION_SPAN) else {
        return Ok(None);
    };

    let executor = if message.contains("vm") {
        Executor::Vm
    } else if message.contains("native") {
        Executor::Native
    } else {
        bail!("compilation event names no executor: {message:?}");
    };

    let class_hash = span
        .string("class_hash")
        .context("compilation span missing class_hash")?;
    let time_ms = event
        .fields
        .number("time")
        .context("compilation event missing time field")?;
    let size = event
        .fields
        .number("size")
        .context("compilation event missing size field")?;
    let length = span
        .number("length")
        .context("compilation span missing length field")?;

    Ok(Some(CompilationSample {
        class_hash: normalize_hash(&class_hash)?,
        executor,
        time_ms,
        size_kib: size / 1024.0,
        length_kib: length / 1024.0,
    }))
}

/// Normalize a class hash to lowercase `0x…` hex. The logs carry hashes
/// either as hex strings or as bare decimal numbers (felts, which overflow
/// u128, hence the digit-string conversion).
pub fn normalize_hash(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            bail!("invalid hex class hash: {raw:?}");
        }
        return Ok(format!("0x{}", hex.to_ascii_lowercase()));
    }
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(format!("0x{}", decimal_to_hex(raw)));
    }
    bail!("invalid class hash: {raw:?}");
}

/// Abbreviate a hash for axis labels: `0x1234…` style.
pub fn abbrev_hash(hash: &str) -> String {
    if hash.len() > 8 {
        format!("{}...", &hash[..8])
    } else {
        hash.to_string()
    }
}

/// Convert an arbitrary-length decimal digit string to hex digits.
fn decimal_to_hex(digits: &str) -> String {
    let mut num: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();
    let mut hex = Vec::new();

    while !num.is_empty() {
        // Divide the decimal digit string by 16, keeping the remainder.
        let mut rem = 0u32;
        let mut quotient = Vec::with_capacity(num.len());
        for &d in &num {
            let cur = rem * 10 + d;
            let q = cur / 16;
            rem = cur % 16;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q);
            }
        }
        hex.push(b"0123456789abcdef"[rem as usize] as char);
        num = quotient;
    }

    if hex.is_empty() {
        hex.push('0');
    }
    hex.iter().rev().collect()
}

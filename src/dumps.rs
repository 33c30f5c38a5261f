//! State-dump comparison: every VM dump under `<root>/vm/` is compared
//! against its native counterpart under `<root>/native/`. Comparisons are
//! independent, so they run in parallel.

use crate::Result;
use anyhow::Context;
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DumpStatus {
    /// Both dumps present and equal after masking.
    Match,
    /// Both dumps present but different.
    Diff,
    /// One side missing or unreadable.
    Miss,
}

impl fmt::Display for DumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpStatus::Match => write!(f, "MATCH"),
            DumpStatus::Diff => write!(f, "DIFF"),
            DumpStatus::Miss => write!(f, "MISS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub status: DumpStatus,
    pub block: String,
    pub tx: String,
}

/// Compare every VM dump under `root` against its native counterpart.
pub fn compare_dumps(root: &Path) -> Result<Vec<Comparison>> {
    let tx_re = Regex::new(r"(0x[0-9a-fA-F]+)\.json$")?;
    let block_re = Regex::new(r"block(\d+)")?;
    // The revert reason is allowed to differ between executors; mask the
    // first line carrying it on both sides.
    let revert_re = Regex::new(r"(?m)^.*revert_error.*$")?;

    let vm_root = root.join("vm");
    let files: Vec<PathBuf> = WalkDir::new(&vm_root)
        .sort_by_file_name()
        .into_iter()
        .collect::<walkdir::Result<Vec<_>>>()
        .with_context(|| format!("walk {}", vm_root.display()))?
        .into_iter()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();

    let native_root = root.join("native");
    files
        .par_iter()
        .map(|vm_path| compare_one(vm_path, &vm_root, &native_root, &tx_re, &block_re, &revert_re))
        .collect()
}

fn compare_one(
    vm_path: &Path,
    vm_root: &Path,
    native_root: &Path,
    tx_re: &Regex,
    block_re: &Regex,
    revert_re: &Regex,
) -> Result<Comparison> {
    // Identify the dump by its path relative to the vm tree; this also keeps
    // a `vm` segment in the user-supplied root from leaking into matching.
    let relative = vm_path
        .strip_prefix(vm_root)
        .with_context(|| format!("dump outside the vm tree: {}", vm_path.display()))?;
    let path_str = relative.to_string_lossy();

    let tx = tx_re
        .captures(&path_str)
        .with_context(|| format!("dump path without tx hash: {path_str}"))?[1]
        .to_string();
    let block = block_re
        .captures(&path_str)
        .with_context(|| format!("dump path without block number: {path_str}"))?[1]
        .to_string();

    let native_path = native_root.join(relative);

    let (vm_dump, native_dump) = match (
        std::fs::read_to_string(vm_path),
        std::fs::read_to_string(&native_path),
    ) {
        (Ok(vm), Ok(native)) => (vm, native),
        _ => return Ok(Comparison { status: DumpStatus::Miss, block, tx }),
    };

    let vm_dump = revert_re.replace(&vm_dump, "");
    let native_dump = revert_re.replace(&native_dump, "");

    let status = if vm_dump == native_dump {
        DumpStatus::Match
    } else {
        DumpStatus::Diff
    };
    Ok(Comparison { status, block, tx })
}

/// Tally comparisons per status.
pub fn count_statuses(comparisons: &[Comparison]) -> BTreeMap<DumpStatus, usize> {
    let mut counts = BTreeMap::new();
    for c in comparisons {
        *counts.entry(c.status).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_dump(root: &Path, side: &str, content: &str) {
        let dir = root.join(side).join("block100");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0xabc.json"), content).unwrap();
    }

    #[test]
    fn equal_dumps_match() {
        let root = tempfile::tempdir().unwrap();
        write_dump(root.path(), "vm", "{\"state\": 1}\n");
        write_dump(root.path(), "native", "{\"state\": 1}\n");

        let results = compare_dumps(root.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, DumpStatus::Match);
        assert_eq!(results[0].block, "100");
        assert_eq!(results[0].tx, "0xabc");
    }

    #[test]
    fn vm_segment_in_the_root_does_not_break_pairing() {
        // The root itself containing a `vm` segment must not be rewritten
        // when locating the native counterpart.
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("vm").join("state_dumps");
        write_dump(&root, "vm", "{\"state\": 1}\n");
        write_dump(&root, "native", "{\"state\": 1}\n");

        let results = compare_dumps(&root).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, DumpStatus::Match);
    }

    #[test]
    fn revert_error_lines_are_masked() {
        let root = tempfile::tempdir().unwrap();
        write_dump(root.path(), "vm", "a\n\"revert_error\": \"vm says no\"\nb\n");
        write_dump(root.path(), "native", "a\n\"revert_error\": \"native says no\"\nb\n");

        let results = compare_dumps(root.path()).unwrap();
        assert_eq!(results[0].status, DumpStatus::Match);
    }

    #[test]
    fn different_dumps_diff_and_missing_native_is_miss() {
        let root = tempfile::tempdir().unwrap();
        write_dump(root.path(), "vm", "{\"state\": 1}");
        write_dump(root.path(), "native", "{\"state\": 2}");
        assert_eq!(compare_dumps(root.path()).unwrap()[0].status, DumpStatus::Diff);

        let lonely = tempfile::tempdir().unwrap();
        write_dump(lonely.path(), "vm", "{}");
        assert_eq!(compare_dumps(lonely.path()).unwrap()[0].status, DumpStatus::Miss);
    }

    #[test]
    fn status_counts() {
        let comparisons = vec![
            Comparison { status: DumpStatus::Match, block: "1".into(), tx: "0x1".into() },
            Comparison { status: DumpStatus::Match, block: "1".into(), tx: "0x2".into() },
            Comparison { status: DumpStatus::Diff, block: "2".into(), tx: "0x3".into() },
        ];
        let counts = count_statuses(&comparisons);
        assert_eq!(counts[&DumpStatus::Match], 2);
        assert_eq!(counts[&DumpStatus::Diff], 1);
        assert_eq!(counts.get(&DumpStatus::Miss), None);
    }
}

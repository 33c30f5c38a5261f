//! Artifact sidecars: every generated chart or table gets a `.meta.json`
//! file describing how the report should present it.

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BTreeMap<String, f64>>,
}

impl ArtifactMeta {
    pub fn new(title: &str, description: &str) -> Self {
        ArtifactMeta {
            title: title.to_string(),
            description: Some(description.to_string()),
            statistics: None,
        }
    }

    pub fn with_statistics(mut self, statistics: BTreeMap<String, f64>) -> Self {
        self.statistics = Some(statistics);
        self
    }
}

/// Kebab-case file stem from a title ("Mean Time by Class" ->
/// "mean-time-by-class").
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Path of the chart image for a metadata record: `<dir>/<slug>.svg`.
pub fn svg_path(dir: &Path, meta: &ArtifactMeta) -> PathBuf {
    dir.join(format!("{}.svg", slugify(&meta.title)))
}

/// Write the `.meta.json` sidecar beside the artifact; returns its path.
pub fn write_meta(dir: &Path, meta: &ArtifactMeta) -> Result<PathBuf> {
    let path = dir.join(format!("{}.meta.json", slugify(&meta.title)));
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(&path, json).with_context(|| format!("write sidecar {}", path.display()))?;
    Ok(path)
}

/// Read the sidecar for an artifact path (`x.svg` -> `x.meta.json`).
pub fn read_meta(artifact: &Path) -> Result<ArtifactMeta> {
    let sidecar = artifact.with_extension("meta.json");
    let text = std::fs::read_to_string(&sidecar)
        .with_context(|| format!("read sidecar {}", sidecar.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed sidecar {}", sidecar.display()))
}

/// Write a tabular artifact as `<slug>.csv` plus its sidecar.
pub fn write_csv_artifact(
    dir: &Path,
    meta: &ArtifactMeta,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", slugify(&meta.title)));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("write table {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    write_meta(dir, meta)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slugs_are_kebab_case() {
        assert_eq!(slugify("Mean Execution Time by Class"), "mean-execution-time-by-class");
        assert_eq!(slugify("Speedup (VM / Native)"), "speedup-vm-native");
        assert_eq!(slugify("  trailing!  "), "trailing");
    }

    #[test]
    fn sidecar_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let meta = ArtifactMeta::new("Some Chart", "What it shows.")
            .with_statistics(BTreeMap::from([("Mean".to_string(), 2.5)]));

        let sidecar = write_meta(dir.path(), &meta).unwrap();
        assert!(sidecar.ends_with("some-chart.meta.json"));

        let loaded = read_meta(&dir.path().join("some-chart.svg")).unwrap();
        assert_eq!(loaded, meta);
    }

    #[test]
    fn csv_artifact_writes_rows_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let meta = ArtifactMeta::new("Edge Cases", "Best and worst.");
        let path = write_csv_artifact(
            dir.path(),
            &meta,
            &["class hash", "time"],
            &[vec!["0x1".to_string(), "2.0".to_string()]],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "class hash,time\n0x1,2.0\n");
        assert!(dir.path().join("edge-cases.meta.json").exists());
    }
}

//! Compilation statistics from per-contract stats dumps
//! (`<class_hash>.stats.json`, one flat JSON object of numeric fields).

use crate::artifact::{self, ArtifactMeta};
use crate::stats::{Summary, correlation_matrix, std_dev};
use crate::{Result, chart, table};
use anyhow::{Context, bail};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

const TIME_VARIABLES: [&str; 7] = [
    "compilation_total_time_ms",
    "compilation_sierra_to_mlir_time_ms",
    "compilation_mlir_passes_time_ms",
    "compilation_mlir_to_llvm_time_ms",
    "compilation_llvm_passes_time_ms",
    "compilation_llvm_to_object_time_ms",
    "compilation_linking_time_ms",
];

const TOTAL_TIME: &str = "compilation_total_time_ms";

#[derive(clap::Args)]
pub struct Args {
    /// Per-contract stats dumps.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for chart and sidecar artifacts.
    #[arg(short = 'o', long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

/// One contract's stats: class hash (from the file name) plus its numeric
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractStats {
    pub hash: String,
    pub fields: BTreeMap<String, f64>,
}

pub fn load_stats(path: &Path) -> Result<ContractStats> {
    let hash = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|h| !h.is_empty())
        .with_context(|| format!("stats file without a hash name: {}", path.display()))?
        .to_string();

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read stats file {}", path.display()))?;
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("malformed stats file {}", path.display()))?;

    let fields = raw
        .into_iter()
        .filter_map(|(k, v)| v.as_f64().map(|v| (k, v)))
        .collect();

    Ok(ContractStats { hash, fields })
}

pub fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.artifacts_dir)?;

    let contracts: Vec<ContractStats> = args
        .inputs
        .iter()
        .map(|p| load_stats(p))
        .collect::<Result<_>>()?;
    info!(contracts = contracts.len(), "loaded contract stats");

    let totals: Vec<(String, f64)> = contracts
        .iter()
        .filter_map(|c| c.fields.get(TOTAL_TIME).map(|t| (c.hash.clone(), *t)))
        .collect();
    if totals.is_empty() {
        bail!("no stats dump carries {TOTAL_TIME}");
    }

    let stages = stage_fractions(&contracts)?;

    let meta = ArtifactMeta::new(
        "Compilation Stages",
        "Share of total compilation time spent in each stage.",
    );
    chart::h_bar_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "fraction of total time",
        &stages,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let total_times: Vec<f64> = totals.iter().map(|(_, t)| *t).collect();
    let meta = ArtifactMeta::new(
        "Compilation Time Histogram",
        "Distribution of total compilation time across contracts.",
    )
    .with_statistics(Summary::describe(&total_times)?.labeled());
    chart::histogram_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Total Compilation Time (ms)",
        &total_times,
        20,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    // Correlations over the numeric fields every dump shares; constant
    // columns have no defined correlation and are dropped.
    let columns = shared_columns(&contracts);
    if columns.len() >= 2 {
        let labels: Vec<String> = columns.iter().map(|(n, _)| n.clone()).collect();
        let matrix = correlation_matrix(&columns)?;

        let meta = ArtifactMeta::new(
            "Correlations Matrix",
            "Pairwise correlation of the per-contract stats fields.",
        );
        chart::heatmap_chart(
            &artifact::svg_path(&args.artifacts_dir, &meta),
            &meta.title,
            &labels,
            &matrix,
        )?;
        artifact::write_meta(&args.artifacts_dir, &meta)?;
    }

    let edge = table::edge_slice(&totals, 10);
    let rows: Vec<Vec<String>> = edge
        .iter()
        .map(|(hash, t)| vec![hash.clone(), format!("{t}")])
        .collect();
    let meta = ArtifactMeta::new(
        "Compilation Time Edge Cases",
        "The contracts with the shortest and longest total compilation time.",
    );
    artifact::write_csv_artifact(
        &args.artifacts_dir,
        &meta,
        &["class hash", "compilation_total_time_ms"],
        &rows,
    )?;

    Ok(())
}

/// Stage breakdown: each stage's share of the summed total time, largest
/// first.
fn stage_fractions(contracts: &[ContractStats]) -> Result<Vec<(String, f64)>> {
    let stage_sum = |name: &str| -> f64 {
        contracts.iter().filter_map(|c| c.fields.get(name)).sum()
    };
    let total_sum = stage_sum(TOTAL_TIME);
    if total_sum == 0.0 {
        bail!("the {TOTAL_TIME} fields sum to zero; stage fractions are undefined");
    }

    let mut stages: Vec<(String, f64)> = TIME_VARIABLES
        .iter()
        .filter(|&&name| name != TOTAL_TIME)
        .map(|&name| (name.to_string(), stage_sum(name) / total_sum))
        .collect();
    stages.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(stages)
}

/// Numeric fields present in every dump with nonzero variance, as columns
/// in contract order.
fn shared_columns(contracts: &[ContractStats]) -> Vec<(String, Vec<f64>)> {
    let Some(first) = contracts.first() else {
        return Vec::new();
    };

    first
        .fields
        .keys()
        .filter(|name| contracts.iter().all(|c| c.fields.contains_key(*name)))
        .map(|name| {
            let values: Vec<f64> =
                contracts.iter().map(|c| c.fields[name]).collect();
            (name.clone(), values)
        })
        .filter(|(_, values)| std_dev(values) > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stats_loading_takes_hash_from_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0xabc.stats.json");
        std::fs::write(
            &path,
            r#"{"compilation_total_time_ms": 120.0, "sierra_func_count": 4, "note": "text"}"#,
        )
        .unwrap();

        let stats = load_stats(&path).unwrap();
        assert_eq!(stats.hash, "0xabc");
        // Non-numeric fields are dropped.
        assert_eq!(
            stats.fields,
            BTreeMap::from([
                ("compilation_total_time_ms".to_string(), 120.0),
                ("sierra_func_count".to_string(), 4.0),
            ])
        );
    }

    fn contract(hash: &str, total: f64, linking: f64) -> ContractStats {
        ContractStats {
            hash: hash.into(),
            fields: BTreeMap::from([
                (TOTAL_TIME.to_string(), total),
                ("compilation_linking_time_ms".to_string(), linking),
            ]),
        }
    }

    #[test]
    fn stage_fractions_are_shares_of_the_total() {
        let stages = stage_fractions(&[contract("0x1", 100.0, 20.0), contract("0x2", 100.0, 30.0)])
            .unwrap();
        assert_eq!(stages[0], ("compilation_linking_time_ms".to_string(), 0.25));
        // Stages absent from every dump contribute zero, not NaN.
        assert!(stages.iter().all(|(_, f)| f.is_finite()));
    }

    #[test]
    fn stage_fractions_reject_a_zero_total() {
        let err = stage_fractions(&[contract("0x1", 0.0, 0.0)]).unwrap_err();
        assert!(err.to_string().contains("sum to zero"), "{err}");
    }

    #[test]
    fn shared_columns_drop_missing_and_constant_fields() {
        let contracts = vec![
            ContractStats {
                hash: "0x1".into(),
                fields: BTreeMap::from([
                    ("a".to_string(), 1.0),
                    ("b".to_string(), 5.0),
                    ("only_here".to_string(), 9.0),
                ]),
            },
            ContractStats {
                hash: "0x2".into(),
                fields: BTreeMap::from([("a".to_string(), 2.0), ("b".to_string(), 5.0)]),
            },
        ];

        let columns = shared_columns(&contracts);
        // "b" is constant, "only_here" is not shared.
        assert_eq!(columns, vec![("a".to_string(), vec![1.0, 2.0])]);
    }
}

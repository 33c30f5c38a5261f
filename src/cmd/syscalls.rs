//! Syscall composition: how syscall-heavy transactions are, from block
//! execution dumps joined with libfunc profiling dumps.

use crate::artifact::{self, ArtifactMeta};
use crate::composition::BlockRecord;
use crate::log::load_json_dir;
use crate::profile::{BenchData, LibfuncProfile};
use crate::stats::{Summary, percentage};
use crate::{Result, chart, table};
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub struct Args {
    /// Directory of block execution info dumps (JSON arrays of blocks).
    pub blocks_dir: PathBuf,

    /// Directory of libfunc profiling dumps (JSON arrays of profiles).
    pub profiles_dir: PathBuf,

    /// Per-transaction bench data from the native run; together with
    /// `--vm-bench`, adds the runtime-share vs speedup chart.
    #[arg(long, requires = "vm_bench")]
    pub native_bench: Option<PathBuf>,

    /// Per-transaction bench data from the VM run.
    #[arg(long, requires = "native_bench")]
    pub vm_bench: Option<PathBuf>,

    /// Directory for chart and sidecar artifacts.
    #[arg(short = 'o', long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.artifacts_dir)?;

    let blocks: Vec<BlockRecord> = load_json_dir(&args.blocks_dir)?;
    let profiles: Vec<LibfuncProfile> = load_json_dir(&args.profiles_dir)?;
    info!(blocks = blocks.len(), profiles = profiles.len(), "loaded syscall inputs");

    let rows = syscall_percentages(&blocks, &profiles);
    info!(txs = rows.len(), "joined syscall counts with libfunc profiles");

    let mut by_block: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for (block, _, ptg) in &rows {
        by_block.entry(*block).or_default().push(*ptg);
    }
    let groups: Vec<(String, Vec<f64>)> = by_block
        .into_iter()
        .map(|(block, ptgs)| (block.to_string(), ptgs))
        .collect();

    let meta = ArtifactMeta::new(
        "Syscall Composition by Block",
        "Distribution of each transaction's syscall share of libfunc calls, \
         per block.",
    );
    chart::box_plot(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Syscalls (%)",
        &groups,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let ptgs: Vec<f64> = rows.iter().map(|(_, _, ptg)| *ptg).collect();
    let meta = ArtifactMeta::new(
        "Syscall Percentage Distribution",
        "How much of each transaction's libfunc calls are syscalls.",
    )
    .with_statistics(Summary::describe(&ptgs)?.labeled());
    chart::histogram_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Syscalls (%)",
        &ptgs,
        60,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    if let (Some(native), Some(vm)) = (&args.native_bench, &args.vm_bench) {
        let native = load_bench(native)?;
        let vm = load_bench(vm)?;
        let speedups = table::join_intersect(native, vm);

        let runtime = runtime_percentages(&profiles);
        let points: Vec<(f64, f64)> = speedups
            .iter()
            .filter_map(|(tx, (native_ns, vm_ns))| {
                runtime.get(tx).map(|ptg| (vm_ns / native_ns, *ptg))
            })
            .collect();

        let meta = ArtifactMeta::new(
            "Runtime Share vs Speedup",
            "Share of libfunc time spent in runtime libfuncs against the \
             per-transaction speedup.",
        );
        chart::regression_chart(
            &artifact::svg_path(&args.artifacts_dir, &meta),
            &meta.title,
            "Speedup",
            "Runtime (%)",
            &[chart::Series { label: "transactions".to_string(), points }],
        )?;
        artifact::write_meta(&args.artifacts_dir, &meta)?;
    }

    Ok(())
}

/// Per-transaction syscall percentage: syscalls recorded in the block dumps
/// over total libfunc calls from the profiles, joined on (block, tx hash).
fn syscall_percentages(
    blocks: &[BlockRecord],
    profiles: &[LibfuncProfile],
) -> Vec<(u64, String, f64)> {
    let mut calls: BTreeMap<(u64, String), u64> = BTreeMap::new();
    for profile in profiles {
        *calls.entry((profile.block_number, profile.tx_hash.clone())).or_default() +=
            profile.total_calls();
    }

    let mut rows = Vec::new();
    for block in blocks {
        for tx in block.entrypoints.iter().flatten() {
            let Some(tx_hash) = &tx.tx_hash else {
                continue;
            };
            let Some(&libfunc_calls) = calls.get(&(block.block_number, tx_hash.clone())) else {
                continue;
            };
            rows.push((
                block.block_number,
                tx_hash.clone(),
                percentage(tx.syscall_count() as f64, libfunc_calls as f64),
            ));
        }
    }
    rows
}

/// Per-transaction runtime share, aggregating a transaction's profile
/// records before dividing.
fn runtime_percentages(profiles: &[LibfuncProfile]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for profile in profiles {
        let (runtime, libfunc) = sums.entry(profile.tx_hash.clone()).or_default();
        *runtime += profile.runtime_time();
        *libfunc += profile.libfunc_time();
    }
    sums.into_iter()
        .map(|(tx, (runtime, libfunc))| (tx, percentage(runtime, libfunc)))
        .collect()
}

fn load_bench(path: &std::path::Path) -> Result<BTreeMap<String, f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read bench file {}", path.display()))?;
    let data: BenchData = serde_json::from_str(&text)
        .with_context(|| format!("malformed bench file {}", path.display()))?;
    Ok(data
        .transactions
        .into_iter()
        .map(|tx| (tx.hash, tx.time_ns))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{Call, CallTree, TxCallInfos};
    use crate::profile::LibfuncSample;
    use pretty_assertions::assert_eq;

    fn block_tx(tx_hash: &str, syscalls: u64) -> TxCallInfos {
        TxCallInfos {
            tx_hash: Some(tx_hash.to_string()),
            validate_call_info: None,
            execute_call_info: Some(CallTree {
                root: Call { selector: "0xexec".to_string(), syscall_count: syscalls },
                inner: vec![],
            }),
            fee_transfer_call_info: None,
        }
    }

    fn profile(block: u64, tx_hash: &str, samples: u64) -> LibfuncProfile {
        LibfuncProfile {
            block_number: block,
            tx_hash: tx_hash.to_string(),
            data: vec![LibfuncSample {
                libfunc_name: "felt252_add".to_string(),
                samples,
                total_time: 1.0,
            }],
        }
    }

    #[test]
    fn percentages_join_on_block_and_tx() {
        let blocks = vec![BlockRecord {
            block_number: 5,
            block_timestamp: 0,
            entrypoints: vec![
                Some(block_tx("0xa", 25)),
                Some(block_tx("0xb", 1)),
                // Reverted slot and a tx the profiles never saw.
                None,
                Some(block_tx("0xc", 9)),
            ],
        }];
        // Two profile records for 0xa aggregate before dividing.
        let profiles = vec![profile(5, "0xa", 60), profile(5, "0xa", 40), profile(5, "0xb", 50)];

        let rows = syscall_percentages(&blocks, &profiles);
        assert_eq!(
            rows,
            vec![(5, "0xa".to_string(), 25.0), (5, "0xb".to_string(), 2.0)]
        );
    }

    #[test]
    fn runtime_share_aggregates_per_tx() {
        let storage = LibfuncSample {
            libfunc_name: "storage_read".to_string(),
            samples: 1,
            total_time: 30.0,
        };
        let add = LibfuncSample {
            libfunc_name: "felt252_add".to_string(),
            samples: 1,
            total_time: 70.0,
        };
        let profiles = vec![
            LibfuncProfile { block_number: 1, tx_hash: "0xa".to_string(), data: vec![storage] },
            LibfuncProfile { block_number: 2, tx_hash: "0xa".to_string(), data: vec![add] },
        ];

        let runtime = runtime_percentages(&profiles);
        assert_eq!(runtime["0xa"], 30.0);
    }
}

//! Native vs VM execution time by contract class.

use crate::artifact::{self, ArtifactMeta};
use crate::canon::{self, abbrev_hash};
use crate::log::load_jsonl;
use crate::stats::Summary;
use crate::{Result, chart, table};
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub struct Args {
    /// JSONL log from the native executor run.
    pub native_logs: PathBuf,

    /// JSONL log from the VM executor run.
    pub vm_logs: PathBuf,

    /// Directory for chart and sidecar artifacts.
    #[arg(short = 'o', long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Keep only the N best and N worst classes by speedup.
    #[arg(long, default_value_t = 20)]
    pub edge: usize,
}

pub fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.artifacts_dir)?;

    let native = load_jsonl(&args.native_logs, canon::execution_sample)?;
    let vm = load_jsonl(&args.vm_logs, canon::execution_sample)?;
    info!(native = native.len(), vm = vm.len(), "loaded execution samples");

    let native = table::group_stats(native.into_iter().map(|s| (s.class_hash, s.time)));
    let vm = table::group_stats(vm.into_iter().map(|s| (s.class_hash, s.time)));
    let joined = table::join_aligned(native, vm)?;

    let mean_speedup = table::mean_speedup(&joined);
    info!(classes = joined.len(), mean_speedup, "joined execution datasets");

    // Report only the extremes; the middle of the distribution is noise at
    // this scale.
    let speedups: Vec<(String, f64)> =
        joined.iter().map(|(k, p)| (k.clone(), p.speedup)).collect();
    let edge = table::edge_slice(&speedups, args.edge);

    let times: Vec<(String, f64, f64)> = edge
        .iter()
        .map(|(hash, _)| {
            let pair = &joined[hash];
            (abbrev_hash(hash), pair.native.mean(), pair.vm.mean())
        })
        .collect();

    let all_speedups: Vec<f64> = joined.values().map(|p| p.speedup).collect();
    let statistics = Summary::describe(&all_speedups)?.labeled();

    let meta = ArtifactMeta::new(
        "Mean Execution Time by Contract Class",
        "Mean native and VM execution time (ns) for the classes with the \
         most extreme speedups.",
    );
    chart::paired_bar_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Mean Time (ns)",
        ("Native Execution Time", "VM Execution Time"),
        &times,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let bars: Vec<(String, f64)> =
        edge.iter().map(|(hash, s)| (abbrev_hash(hash), *s)).collect();
    let meta = ArtifactMeta::new(
        "Execution Speedup by Contract Class",
        "VM execution time over native execution time; higher is better \
         for the native executor.",
    )
    .with_statistics(statistics);
    chart::h_bar_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Speedup",
        &bars,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    println!("Average Speedup: {mean_speedup}");
    Ok(())
}

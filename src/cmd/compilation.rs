//! Compilation time/size analysis from a combined native+VM log.

use crate::artifact::{self, ArtifactMeta};
use crate::canon::{self, CompilationSample, Executor};
use crate::chart::{self, Series};
use crate::log::load_jsonl;
use crate::stats::Summary;
use crate::{Result, table};
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub struct Args {
    /// JSONL log containing both executors' compilation events.
    pub logs: PathBuf,

    /// Directory for chart and sidecar artifacts.
    #[arg(short = 'o', long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.artifacts_dir)?;

    let samples = load_jsonl(&args.logs, canon::compilation_sample)?;
    let (native, vm): (Vec<CompilationSample>, Vec<CompilationSample>) = samples
        .into_iter()
        .partition(|s| s.executor == Executor::Native);
    info!(native = native.len(), vm = vm.len(), "loaded compilation samples");

    let time_series = |label: &str, samples: &[CompilationSample]| Series {
        label: label.to_string(),
        points: samples.iter().map(|s| (s.length_kib, s.time_ms)).collect(),
    };
    let size_series = |label: &str, samples: &[CompilationSample]| Series {
        label: label.to_string(),
        points: samples.iter().map(|s| (s.length_kib, s.size_kib)).collect(),
    };

    let meta = ArtifactMeta::new(
        "Compilation Time Trend",
        "Compilation time against Sierra program size, per executor.",
    );
    chart::regression_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Sierra size (KiB)",
        "Compilation Time (ms)",
        &[time_series("Native", &native), time_series("Casm", &vm)],
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let meta = ArtifactMeta::new(
        "Compilation Size Trend",
        "Compiled output size against Sierra program size, per executor.",
    );
    chart::regression_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Sierra size (KiB)",
        "Compiled size (KiB)",
        &[size_series("Native", &native), size_series("Casm", &vm)],
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    // Size correlation pairs per-class mean sizes; partial logs are normal
    // here, so the join keeps the intersection.
    let native_size =
        table::group_stats(native.iter().map(|s| (s.class_hash.clone(), s.size_kib)));
    let vm_size = table::group_stats(vm.iter().map(|s| (s.class_hash.clone(), s.size_kib)));
    let correlated = table::join_intersect(native_size, vm_size);
    let points: Vec<(f64, f64)> = correlated
        .values()
        .map(|(n, v)| (n.mean(), v.mean()))
        .collect();

    let meta = ArtifactMeta::new(
        "Compilation Size Correlation",
        "Native shared-library size against casm size for classes compiled \
         by both executors.",
    );
    chart::regression_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Native Compilation Size (KiB)",
        "Casm Compilation Size (KiB)",
        &[Series { label: "size".to_string(), points }],
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let mut sizes: Vec<(String, f64)> = table::group_stats(
        native.iter().map(|s| (s.class_hash.clone(), s.size_kib)),
    )
    .into_iter()
    .map(|(hash, stats)| (canon::abbrev_hash(&hash), stats.mean() / 1024.0))
    .collect();
    sizes.sort_by(|a, b| b.1.total_cmp(&a.1));

    let meta = ArtifactMeta::new(
        "Native Library Size by Contract",
        "Mean compiled shared-library size per contract class.",
    );
    chart::h_bar_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Library Size (MiB)",
        &sizes,
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let native_times: Vec<f64> = native.iter().map(|s| s.time_ms).collect();
    let vm_times: Vec<f64> = vm.iter().map(|s| s.time_ms).collect();
    let mut statistics = Summary::describe(&native_times)?.labeled();
    statistics.insert("Mean (casm)".to_string(), crate::stats::mean(&vm_times));

    let meta = ArtifactMeta::new(
        "Compilation Time Distribution",
        "Distribution of compilation times per executor.",
    )
    .with_statistics(statistics);
    chart::box_plot(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "Compilation Time (ms)",
        &[("Native".to_string(), native_times), ("Casm".to_string(), vm_times)],
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    Ok(())
}

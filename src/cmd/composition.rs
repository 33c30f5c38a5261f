//! Block composition trends from a directory of block execution dumps.

use crate::artifact::{self, ArtifactMeta};
use crate::composition::{self, BlockRecord, BlockRow};
use crate::log::load_json_dir;
use crate::stats::Summary;
use crate::{Result, chart};
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub struct Args {
    /// Directory of block execution info dumps (JSON arrays of blocks).
    pub blocks_dir: PathBuf,

    /// Directory for chart and sidecar artifacts.
    #[arg(short = 'o', long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.artifacts_dir)?;

    let blocks: Vec<BlockRecord> = load_json_dir(&args.blocks_dir)?;
    let rows: Vec<BlockRow> = blocks.iter().map(composition::block_row).collect();
    info!(blocks = rows.len(), "derived block composition rows");

    let days = composition::group_by_day(&rows);

    let series = |pick: fn(&composition::DayAverages) -> f64| -> Vec<(i64, f64)> {
        days.iter().map(|(day, avg)| (*day, pick(avg))).collect()
    };

    let meta = ArtifactMeta::new(
        "Average Block Composition",
        "Average transactions, pure transfers and swaps per block, by day.",
    )
    .with_statistics(
        Summary::describe(&rows.iter().map(|r| r.txs as f64).collect::<Vec<_>>())?.labeled(),
    );
    chart::trend_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "average per block",
        &composition::day_label,
        &[
            ("average txs".to_string(), series(|a| a.txs)),
            ("average transfers".to_string(), series(|a| a.transfers)),
            ("average swaps".to_string(), series(|a| a.swaps)),
        ],
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    let meta = ArtifactMeta::new(
        "Average Block Composition Percentage",
        "Average share of pure transfers and swaps in a block, by day.",
    );
    chart::trend_chart(
        &artifact::svg_path(&args.artifacts_dir, &meta),
        &meta.title,
        "average per block (%)",
        &composition::day_label,
        &[
            ("average transfers".to_string(), series(|a| a.transfers_ptg)),
            ("average swaps".to_string(), series(|a| a.swaps_ptg)),
        ],
    )?;
    artifact::write_meta(&args.artifacts_dir, &meta)?;

    Ok(())
}

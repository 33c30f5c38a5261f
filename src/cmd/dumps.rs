//! Parallel comparison of native and VM state dumps.

use crate::Result;
use crate::dumps::{DumpStatus, compare_dumps, count_statuses};
use std::path::PathBuf;
use tracing::debug;

#[derive(clap::Args)]
pub struct Args {
    /// Root directory holding the `vm/` and `native/` dump trees.
    #[arg(default_value = "state_dumps")]
    pub dumps_dir: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    let comparisons = compare_dumps(&args.dumps_dir)?;

    for c in &comparisons {
        if c.status != DumpStatus::Match {
            debug!(status = %c.status, block = %c.block, tx = %c.tx, "dump mismatch");
        }
    }

    println!("Compared {} dumps", comparisons.len());
    for (status, count) in count_statuses(&comparisons) {
        println!("{status} {count}");
    }
    Ok(())
}

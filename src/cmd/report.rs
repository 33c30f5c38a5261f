//! Assemble the final HTML report from benchmark artifacts.

use crate::Result;
use crate::report::render_report;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub struct Args {
    /// JSON file of general benchmark information (title, versions, host),
    /// listed at the top of the report.
    pub info: PathBuf,

    /// Artifacts to include, each with a `.meta.json` sidecar.
    pub artifacts: Vec<PathBuf>,

    /// Output path for the generated HTML report.
    #[arg(short = 'o', long, default_value = "report.html")]
    pub output: PathBuf,

    /// Inline the SVG images instead of referencing them.
    #[arg(long)]
    pub self_contained: bool,
}

pub fn run(args: Args) -> Result<()> {
    let info_text = std::fs::read_to_string(&args.info)
        .with_context(|| format!("read info file {}", args.info.display()))?;
    let info: BTreeMap<String, String> = serde_json::from_str(&info_text)
        .with_context(|| format!("malformed info file {}", args.info.display()))?;

    let artifacts: Vec<&Path> = args.artifacts.iter().map(PathBuf::as_path).collect();
    let html = render_report(&info, &artifacts, &args.output, args.self_contained)?;
    std::fs::write(&args.output, html)
        .with_context(|| format!("write report {}", args.output.display()))?;

    println!("Wrote {}", args.output.display());
    Ok(())
}

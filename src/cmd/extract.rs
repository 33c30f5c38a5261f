//! Extract canonical execution samples from a raw log into a smaller JSONL
//! file, so the heavier analyses can re-read them cheaply.

use crate::Result;
use crate::canon;
use crate::log::load_jsonl;
use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub struct Args {
    /// Raw JSONL event log.
    pub input: PathBuf,

    /// Output path; defaults to `<input>-execution`.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<()> {
    let output = args.output.unwrap_or_else(|| {
        let mut name = args.input.as_os_str().to_owned();
        name.push("-execution");
        PathBuf::from(name)
    });

    let samples = load_jsonl(&args.input, canon::execution_sample)?;

    let mut file = std::fs::File::create(&output)
        .with_context(|| format!("create output file {}", output.display()))?;
    for sample in &samples {
        serde_json::to_writer(&mut file, sample)?;
        file.write_all(b"\n")?;
    }

    info!(samples = samples.len(), output = %output.display(), "extracted execution samples");
    Ok(())
}

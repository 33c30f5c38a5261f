use clap::{Parser, Subcommand};

mod artifact;
mod canon;
mod chart;
mod cmd;
mod composition;
mod dumps;
mod log;
mod profile;
mod report;
mod stats;
mod table;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "benchviz")]
#[command(about = "Benchmark analysis for the native vs VM contract executors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare native and VM execution time by contract class.
    Execution(cmd::execution::Args),

    /// Compilation time/size trends and correlations from a combined log.
    Compilation(cmd::compilation::Args),

    /// Block composition trends (transactions, transfers, swaps) per day.
    Composition(cmd::composition::Args),

    /// Stage breakdown and correlations from per-contract compilation stats.
    Stats(cmd::stats::Args),

    /// Syscall share of transactions from block dumps and libfunc profiles.
    Syscalls(cmd::syscalls::Args),

    /// Extract canonical execution samples from a raw log into JSONL.
    ExtractExecution(cmd::extract::Args),

    /// Compare native and VM state dumps in parallel.
    CompareDumps(cmd::dumps::Args),

    /// Assemble an HTML report from benchmark artifacts.
    Report(cmd::report::Args),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Execution(args) => cmd::execution::run(args),
        Commands::Compilation(args) => cmd::compilation::run(args),
        Commands::Composition(args) => cmd::composition::run(args),
        Commands::Stats(args) => cmd::stats::run(args),
        Commands::Syscalls(args) => cmd::syscalls::run(args),
        Commands::ExtractExecution(args) => cmd::extract::run(args),
        Commands::CompareDumps(args) => cmd::dumps::run(args),
        Commands::Report(args) => cmd::report::run(args),
    }
}

//! One module per analysis subcommand, wiring loaders, aggregation, charts
//! and artifacts together.

pub mod compilation;
pub mod composition;
pub mod dumps;
pub mod execution;
pub mod extract;
pub mod report;
pub mod stats;
pub mod syscalls;

//! Log loading: JSONL tracing events and batch JSON dumps.

pub mod event;
pub mod load;

pub use event::{Fields, LogEvent, Span};
pub use load::{load_json_array, load_json_dir, load_jsonl};

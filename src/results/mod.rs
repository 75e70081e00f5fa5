//! Measurement results: per-task sample series and the persistent store.

mod store;
mod task_results;

pub use store::{MergeMode, OutputFormat, ResultsStore};
pub use task_results::TaskResults;

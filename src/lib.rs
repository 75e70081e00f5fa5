//! # sweepbench
//!
//! Measure how a workload's running time scales with its input size.
//!
//! A benchmark registers named tasks, each consuming a generated input of a
//! given size. The runner sweeps every task across a size progression,
//! takes one adaptively calibrated timing per (task, size) pair per cycle,
//! and accumulates the results into a versioned, mergeable store.
//!
//! ## Timing conventions
//!
//! By default the harness times the whole task invocation ("direct" mode).
//! A task that needs to exclude setup or teardown wraps its hot section in
//! [`Stopwatch::measure`] ("nested" mode); the convention is detected on
//! the first invocation and enforced afterwards. Either way, calibration
//! repeats the workload under a time budget and reports the running
//! minimum, since scheduling noise only ever inflates latency.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sweepbench::{Benchmark, InputKey, RunOptions, Size};
//!
//! let mut benchmark = Benchmark::new();
//! benchmark.add_simple::<Vec<u64>, _>(
//!     "sum", InputKey::SHUFFLED_U64S, None,
//!     |input, _| { sweepbench::black_box(input.iter().sum::<u64>()); },
//! );
//!
//! let options = RunOptions {
//!     sizes: [16u64, 256, 4096].map(Size::new).to_vec(),
//!     cycles: 3,
//!     ..RunOptions::default()
//! };
//! let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
//! for results in store.tasks() {
//!     for (size, sample) in results.samples() {
//!         println!("{} @ {}: {}", results.id(), size, sample);
//!     }
//! }
//! ```

#![warn(clippy::all)]

mod clock;
mod error;
mod measure;
mod results;
mod runner;
mod sample;
mod size;
mod sorted;
mod task;
mod time;

pub use clock::{Clock, MonotonicClock, Tick};
pub use error::Error;
pub use measure::{black_box, calibrated_measure, MeasurementOptions, Stopwatch};
pub use results::{MergeMode, OutputFormat, ResultsStore, TaskResults};
pub use runner::{run, Driver, Event, RunOptions, SkipReason};
pub use sample::{Sample, Statistic};
pub use size::Size;
pub use sorted::{SortedBag, SortedMap};
pub use task::{Benchmark, InputKey, Task, TaskBody, TaskID};
pub use time::Time;

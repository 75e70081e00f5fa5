//! The measurement driver: cycles over tasks and sizes.
//!
//! A run walks every selected task across every selected size, takes one
//! calibrated measurement per (task, size) pair per cycle, and accumulates
//! the results into a [`ResultsStore`]. The store checkpoints to disk
//! between measurement points (never mid-measurement) and flushes
//! unconditionally at the end of each cycle and of the run, so an
//! interrupted run loses at most the single in-flight measurement.
//!
//! Everything is single-threaded and synchronous: concurrent tasks would
//! stop competing for identical CPU and cache conditions, invalidating
//! comparisons between them.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::clock::{Clock, MonotonicClock};
use crate::error::Error;
use crate::measure::{amortized_cutoff_reached, calibrated_measure, MeasurementOptions};
use crate::results::{OutputFormat, ResultsStore};
use crate::size::Size;
use crate::task::{Benchmark, TaskID};
use crate::time::Time;

/// Minimum wall-clock between checkpoint saves, so fast suites don't
/// amplify writes.
const SAVE_PERIOD: Time = Time::attoseconds(10 * 1_000_000_000_000_000_000);

/// Configuration for one run.
///
/// `cycles` of zero means "repeat until interrupted"; a negative count is a
/// defect in the caller and panics. An empty `tasks` list selects every
/// registered task; an empty `sizes` list generates the geometric
/// progression between `minimum_size` and `maximum_size`.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub tasks: Vec<String>,
    pub sizes: Vec<Size>,
    pub minimum_size: Size,
    pub maximum_size: Size,
    pub cycles: i64,
    pub iterations: u64,
    pub minimum_duration: Time,
    pub maximum_duration: Time,
    pub amortized_cutoff: Option<Time>,
    pub save_path: Option<PathBuf>,
    pub output_format: OutputFormat,
    /// Provenance link recorded on every measured task's results.
    pub link: Option<String>,
}

impl Default for RunOptions {
    fn default() -> RunOptions {
        RunOptions {
            tasks: Vec::new(),
            sizes: Vec::new(),
            minimum_size: Size::new(1),
            maximum_size: Size::new(1 << 20),
            cycles: 1,
            iterations: 3,
            minimum_duration: Time::milliseconds(10.0),
            maximum_duration: Time::ETERNITY,
            amortized_cutoff: None,
            save_path: None,
            output_format: OutputFormat::Pretty,
            link: None,
        }
    }
}

/// Why a (task, size) pair produced no sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The size exceeds the task's declared maximum.
    AboveMaxSize,
    /// The task's per-element time already exceeded the amortized cutoff
    /// at this size or a smaller one.
    PastAmortizedCutoff,
    /// The task's prepare step declined this input.
    InputDeclined,
}

/// Progress notifications delivered to the run delegate.
///
/// The delegate may fail; its error aborts the run after a final flush.
#[derive(Debug)]
pub enum Event<'a> {
    CycleStarted { cycle: u64 },
    CycleFinished { cycle: u64, elapsed: Time },
    TaskStarted { task: &'a TaskID },
    TaskFinished { task: &'a TaskID },
    MeasurementFinished { task: &'a TaskID, size: Size, time: Time },
    SizeSkipped { task: &'a TaskID, size: Size, reason: SkipReason },
}

/// Resolve the task selection to registration-order indices.
pub(crate) fn resolve_tasks(benchmark: &Benchmark, names: &[String]) -> Result<Vec<usize>, Error> {
    if names.is_empty() {
        if benchmark.tasks().is_empty() {
            return Err(Error::EmptyTaskSelection);
        }
        return Ok((0..benchmark.tasks().len()).collect());
    }
    names
        .iter()
        .map(|name| {
            benchmark
                .tasks()
                .iter()
                .position(|task| task.id().to_string() == *name)
                .ok_or_else(|| Error::UnknownTask { name: name.clone() })
        })
        .collect()
}

/// Resolve the size selection to an ascending, duplicate-free list.
pub(crate) fn resolve_sizes(options: &RunOptions) -> Result<Vec<Size>, Error> {
    let mut sizes = if options.sizes.is_empty() {
        Size::sizes(options.minimum_size..=options.maximum_size, 2)
    } else {
        options.sizes.clone()
    };
    sizes.sort();
    if sizes.is_empty() {
        return Err(Error::EmptySizeSelection);
    }
    if let Some(pair) = sizes.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(Error::DuplicateSizeEntry { size: pair[0].key_string() });
    }
    Ok(sizes)
}

/// Run the benchmark and return the accumulated store.
///
/// If `options.save_path` names an existing document, its contents are
/// loaded first and new samples accumulate on top of them.
pub fn run(
    benchmark: &mut Benchmark,
    options: &RunOptions,
    mut delegate: impl FnMut(Event<'_>) -> Result<(), Error>,
) -> Result<ResultsStore, Error> {
    assert!(options.cycles >= 0, "cycle count must be nonnegative");
    let tasks = resolve_tasks(benchmark, &options.tasks)?;
    let sizes = resolve_sizes(options)?;

    let mut store = match &options.save_path {
        Some(path) => ResultsStore::load_or_empty(path)?,
        None => ResultsStore::new(),
    };

    let outcome = run_cycles(
        benchmark,
        options,
        &tasks,
        &sizes,
        &mut store,
        &mut delegate,
    );
    // Flush before surfacing any error so completed samples survive.
    if let Some(path) = &options.save_path {
        store.save(path, options.output_format)?;
    }
    outcome?;
    Ok(store)
}

fn run_cycles(
    benchmark: &mut Benchmark,
    options: &RunOptions,
    tasks: &[usize],
    sizes: &[Size],
    store: &mut ResultsStore,
    delegate: &mut impl FnMut(Event<'_>) -> Result<(), Error>,
) -> Result<(), Error> {
    let clock = MonotonicClock::new();
    let measurement = MeasurementOptions {
        iterations: options.iterations,
        minimum_duration: options.minimum_duration,
        maximum_duration: options.maximum_duration,
    };
    let mut last_save = clock.now();
    // Smallest size at which each task hit the amortized cutoff; survives
    // across cycles.
    let mut cutoffs: HashMap<usize, Size> = HashMap::new();

    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        if options.cycles > 0 && cycle > options.cycles as u64 {
            return Ok(());
        }
        delegate(Event::CycleStarted { cycle })?;
        let cycle_start = clock.now();
        benchmark.clear_input_cache();

        for &index in tasks {
            let id = benchmark.tasks()[index].id().clone();
            delegate(Event::TaskStarted { task: &id })?;

            for &size in sizes {
                let (input_key, max_size) = {
                    let task = &benchmark.tasks()[index];
                    (task.input_key().clone(), task.max_size())
                };
                if max_size.is_some_and(|max| size > max) {
                    delegate(Event::SizeSkipped {
                        task: &id,
                        size,
                        reason: SkipReason::AboveMaxSize,
                    })?;
                    continue;
                }
                if cutoffs.get(&index).is_some_and(|&cut| cut <= size) {
                    delegate(Event::SizeSkipped {
                        task: &id,
                        size,
                        reason: SkipReason::PastAmortizedCutoff,
                    })?;
                    continue;
                }

                let input = benchmark.input_for(&input_key, size);
                let Some(mut body) = benchmark.tasks()[index].prepare(input) else {
                    delegate(Event::SizeSkipped {
                        task: &id,
                        size,
                        reason: SkipReason::InputDeclined,
                    })?;
                    continue;
                };
                let time = calibrated_measure(&clock, &measurement, &mut body);
                drop(body);

                store.add(&id, size, time);
                if options.link.is_some() {
                    store.results_mut(&id).set_link(options.link.clone());
                }
                delegate(Event::MeasurementFinished { task: &id, size, time })?;

                if let Some(cutoff) = options.amortized_cutoff {
                    if amortized_cutoff_reached(time, size, cutoff)
                        && cutoffs.get(&index).map_or(true, |&cut| size < cut)
                    {
                        debug!(task = %id, %size, "amortized cutoff reached");
                        cutoffs.insert(index, size);
                    }
                }
                if let Some(path) = &options.save_path {
                    if clock.elapsed(last_save) > SAVE_PERIOD {
                        store.save(path, options.output_format)?;
                        last_save = clock.now();
                    }
                }
            }
            delegate(Event::TaskFinished { task: &id })?;
        }

        if let Some(path) = &options.save_path {
            store.save(path, options.output_format)?;
            last_save = clock.now();
        }
        let elapsed = clock.elapsed(cycle_start);
        info!(cycle, %elapsed, "cycle finished");
        delegate(Event::CycleFinished { cycle, elapsed })?;
    }
}

/// Top-level harness state: did any benchmark actually execute?
///
/// Entry points create a driver, run through it, and call
/// [`Driver::finish`] at shutdown; finishing a driver that never executed
/// anything panics, catching wrappers that accidentally skip the run.
#[derive(Debug, Default)]
pub struct Driver {
    executed: bool,
}

impl Driver {
    pub fn new() -> Driver {
        Driver { executed: false }
    }

    /// Run the benchmark, marking this driver as executed.
    pub fn run(
        &mut self,
        benchmark: &mut Benchmark,
        options: &RunOptions,
        delegate: impl FnMut(Event<'_>) -> Result<(), Error>,
    ) -> Result<ResultsStore, Error> {
        self.executed = true;
        run(benchmark, options, delegate)
    }

    /// Whether anything has executed through this driver.
    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Consume the driver at shutdown.
    ///
    /// Panics if nothing was ever executed.
    pub fn finish(self) {
        assert!(
            self.executed,
            "benchmark driver finished without executing anything"
        );
    }
}

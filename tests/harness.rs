//! End-to-end measurement scenarios.

use sweepbench::{
    Benchmark, Driver, Event, InputKey, ResultsStore, RunOptions, Size, TaskID, Time,
};

fn id(text: &str) -> TaskID {
    text.parse().unwrap()
}

fn sum_benchmark() -> Benchmark {
    let mut benchmark = Benchmark::new();
    benchmark.add_simple::<Vec<u64>, _>("sum", InputKey::SHUFFLED_U64S, None, |input, _| {
        sweepbench::black_box(input.iter().sum::<u64>());
    });
    benchmark
}

#[test]
fn two_cycles_append_one_sample_per_size_each() {
    let mut benchmark = sum_benchmark();
    let options = RunOptions {
        sizes: [1u64, 10, 100].map(Size::new).to_vec(),
        cycles: 2,
        iterations: 3,
        minimum_duration: Time::milliseconds(10.0),
        ..RunOptions::default()
    };
    let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();

    assert_eq!(store.task_count(), 1);
    assert_eq!(store.sample_count(), 6);
    for size in [1u64, 10, 100] {
        let sample = store.sample(&id("sum"), Size::new(size)).unwrap();
        assert_eq!(sample.count(), 2);
        assert!(sample.minimum().unwrap() > Time::ZERO);
    }

    // The persisted document round-trips to an identical in-memory store.
    let text = store.to_json(sweepbench::OutputFormat::Compact).unwrap();
    assert_eq!(ResultsStore::from_json(&text).unwrap(), store);
}

#[test]
fn self_timed_tasks_run_through_the_harness() {
    let mut benchmark = Benchmark::new();
    benchmark.add::<Vec<u64>, _>(
        "sort prepared copy",
        InputKey::SHUFFLED_U64S,
        None,
        |input: std::rc::Rc<Vec<u64>>| {
            Some(Box::new(move |stopwatch: &mut sweepbench::Stopwatch<'_>| {
                // The copy is setup; only the sort is timed.
                let mut copy = (*input).clone();
                stopwatch.measure(|| copy.sort());
                sweepbench::black_box(copy);
            }))
        },
    );
    let options = RunOptions {
        sizes: vec![Size::new(256)],
        cycles: 1,
        iterations: 2,
        minimum_duration: Time::ZERO,
        ..RunOptions::default()
    };
    let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
    let sample = store.sample(&id("sort prepared copy"), Size::new(256)).unwrap();
    assert_eq!(sample.count(), 1);
    assert!(sample.minimum().unwrap() > Time::ZERO);
}

#[test]
fn sizes_above_max_size_leave_no_trace() {
    let mut benchmark = Benchmark::new();
    benchmark.add_simple::<u64, _>("capped", InputKey::U64, Some(Size::new(50)), |&size, _| {
        sweepbench::black_box(size);
    });
    let options = RunOptions {
        sizes: vec![Size::new(10), Size::new(100)],
        cycles: 1,
        iterations: 1,
        minimum_duration: Time::ZERO,
        ..RunOptions::default()
    };
    let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
    assert!(store.sample(&id("capped"), Size::new(10)).is_some());
    assert!(store.sample(&id("capped"), Size::new(100)).is_none());
    let results = store.results_for(&id("capped")).unwrap();
    assert_eq!(results.sizes().collect::<Vec<_>>(), [Size::new(10)]);
}

#[test]
fn provenance_links_are_recorded() {
    let mut benchmark = sum_benchmark();
    let options = RunOptions {
        sizes: vec![Size::new(16)],
        cycles: 1,
        iterations: 1,
        minimum_duration: Time::ZERO,
        link: Some("https://example.org/suite.rs#sum".to_string()),
        ..RunOptions::default()
    };
    let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
    assert_eq!(
        store.results_for(&id("sum")).unwrap().link(),
        Some("https://example.org/suite.rs#sum")
    );
}

#[test]
fn selections_restrict_the_run() {
    let mut benchmark = sum_benchmark();
    benchmark.add_simple::<u64, _>("noop", InputKey::U64, None, |_, _| {});
    let options = RunOptions {
        tasks: vec!["noop".to_string()],
        sizes: vec![Size::new(4)],
        cycles: 1,
        iterations: 1,
        minimum_duration: Time::ZERO,
        ..RunOptions::default()
    };
    let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
    assert!(store.contains(&id("noop")));
    assert!(!store.contains(&id("sum")));
}

#[test]
fn driver_tracks_execution_across_runs() {
    let mut driver = Driver::new();
    let mut benchmark = sum_benchmark();
    let options = RunOptions {
        sizes: vec![Size::new(4)],
        cycles: 1,
        iterations: 1,
        minimum_duration: Time::ZERO,
        ..RunOptions::default()
    };
    let mut measured = 0;
    driver
        .run(&mut benchmark, &options, |event| {
            if matches!(event, Event::MeasurementFinished { .. }) {
                measured += 1;
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(measured, 1);
    driver.finish();
}

//! On-disk round-trips of the results document.

use std::fs;

use sweepbench::{
    Benchmark, Error, InputKey, OutputFormat, ResultsStore, RunOptions, Size, TaskID, Time,
};

fn id(text: &str) -> TaskID {
    text.parse().unwrap()
}

fn sample_store() -> ResultsStore {
    let mut store = ResultsStore::new();
    for (task, size, micros) in [
        ("[std]append", 1u64, 0.75),
        ("[std]append", 1024, 12.5),
        ("sum", 1 << 20, 4250.0),
        ("sum", 1 << 20, 4375.0),
    ] {
        store.add(&id(task), Size::new(size), Time::microseconds(micros));
    }
    store
        .results_mut(&id("sum"))
        .set_link(Some("https://example.org/bench.rs#L42".to_string()));
    store
}

#[test]
fn saved_document_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let store = sample_store();
    for (name, format) in [("pretty.json", OutputFormat::Pretty), ("compact.json", OutputFormat::Compact)] {
        let path = dir.path().join(name);
        store.save(&path, format).unwrap();
        let reloaded = ResultsStore::load(&path).unwrap();
        assert_eq!(reloaded, store);
    }
}

#[test]
fn missing_files_are_an_error_unless_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    assert!(matches!(ResultsStore::load(&path), Err(Error::Io { .. })));
    let empty = ResultsStore::load_or_empty(&path).unwrap();
    assert_eq!(empty.task_count(), 0);
}

#[test]
fn unsupported_version_on_disk_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    fs::write(&path, r#"{ "version": 7, "tasks": [] }"#).unwrap();
    match ResultsStore::load(&path) {
        Err(Error::UnsupportedVersion { found }) => assert_eq!(found, 7),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[test]
fn malformed_json_is_a_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(ResultsStore::load(&path), Err(Error::Json { .. })));
}

#[test]
fn runs_accumulate_on_top_of_an_existing_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");

    let mut benchmark = Benchmark::new();
    benchmark.add_simple::<u64, _>("touch", InputKey::U64, None, |&size, _| {
        sweepbench::black_box(size);
    });
    let options = RunOptions {
        sizes: vec![Size::new(8), Size::new(64)],
        cycles: 1,
        iterations: 1,
        minimum_duration: Time::ZERO,
        save_path: Some(path.clone()),
        ..RunOptions::default()
    };

    sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
    let after_first = ResultsStore::load(&path).unwrap();
    assert_eq!(after_first.sample(&id("touch"), Size::new(8)).unwrap().count(), 1);

    let store = sweepbench::run(&mut benchmark, &options, |_| Ok(())).unwrap();
    for size in [Size::new(8), Size::new(64)] {
        assert_eq!(store.sample(&id("touch"), size).unwrap().count(), 2);
    }
    // The on-disk document matches the returned store after the final flush.
    assert_eq!(ResultsStore::load(&path).unwrap(), store);
}

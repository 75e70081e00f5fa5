//! The versioned, persistent collection of all task results.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::results::task_results::{TaskResults, TaskResultsRepr};
use crate::sample::Sample;
use crate::size::Size;
use crate::sorted::SortedMap;
use crate::task::TaskID;
use crate::time::Time;

/// The one document schema version this crate reads and writes.
const VERSION: i64 = 1;

/// How a loaded document is folded into an existing store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Union incoming samples with existing ones.
    #[default]
    Append,
    /// Replace the tasks the incoming document mentions; keep the rest.
    Replace,
    /// Drop the existing store entirely, then adopt the incoming one.
    ReplaceAll,
}

/// JSON layout written to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented, human-diffable.
    #[default]
    Pretty,
    /// Single line.
    Compact,
}

/// All results collected so far, keyed by task, ordered by task ID.
///
/// Loads from and saves to a versioned JSON document; mutates in memory
/// during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultsStore {
    tasks: SortedMap<TaskID, TaskResults>,
}

impl ResultsStore {
    pub fn new() -> ResultsStore {
        ResultsStore { tasks: SortedMap::new() }
    }

    /// Number of tasks with an entry (possibly sample-less).
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Total measurements across every task and size.
    pub fn sample_count(&self) -> usize {
        self.tasks.values().map(TaskResults::sample_count).sum()
    }

    pub fn contains(&self, id: &TaskID) -> bool {
        self.tasks.contains_key(id)
    }

    /// Results for `id`, if any were ever recorded.
    pub fn results_for(&self, id: &TaskID) -> Option<&TaskResults> {
        self.tasks.get(id)
    }

    /// Results for `id`, creating an empty entry on first access.
    pub fn results_mut(&mut self, id: &TaskID) -> &mut TaskResults {
        self.tasks
            .get_or_insert_with(id.clone(), || TaskResults::new(id.clone()))
    }

    /// The sample recorded for (`id`, `size`), if any.
    pub fn sample(&self, id: &TaskID, size: Size) -> Option<&Sample> {
        self.tasks.get(id)?.sample(size)
    }

    /// Task results in ascending task ID order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskResults> {
        self.tasks.values()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &TaskID> {
        self.tasks.keys()
    }

    /// Record one measurement.
    pub fn add(&mut self, id: &TaskID, size: Size, time: Time) {
        self.results_mut(id).add(size, time);
    }

    /// Fold one task's results in: samples union per size, and the
    /// incoming link overwrites the existing one regardless of sample
    /// order. Link resolution is last-writer-wins, not commutative.
    pub fn add_results(&mut self, results: TaskResults) {
        let entry = self.results_mut(results.id());
        entry.set_link(results.link().map(str::to_string));
        entry.merge(results);
    }

    /// Fold a whole store in, task by task, per [`Self::add_results`].
    pub fn merge(&mut self, other: ResultsStore) {
        for (_, results) in other.tasks {
            self.add_results(results);
        }
    }

    /// Fold a whole store in under an explicit merge mode.
    pub fn merge_with_mode(&mut self, other: ResultsStore, mode: MergeMode) {
        match mode {
            MergeMode::Append => self.merge(other),
            MergeMode::Replace => {
                for (id, results) in other.tasks {
                    self.tasks.update(id, results);
                }
            }
            MergeMode::ReplaceAll => *self = other,
        }
    }

    /// Remove the named tasks entirely.
    pub fn remove_tasks(&mut self, ids: &[TaskID]) {
        for id in ids {
            self.tasks.remove(id);
        }
    }

    /// Drop the samples at any of `sizes` from the named tasks.
    pub fn clear_sizes(&mut self, sizes: &[Size], ids: &[TaskID]) {
        for id in ids {
            if let Some(results) = self.tasks.get_mut(id) {
                results.remove_sizes(sizes);
            }
        }
    }

    /// Drop every sample while keeping all task entries.
    pub fn clear(&mut self) {
        for results in self.tasks.values_mut() {
            results.clear();
        }
    }

    /// Encode to the versioned document format.
    pub fn to_json(&self, format: OutputFormat) -> Result<String, Error> {
        let document = DocumentOut { version: VERSION, tasks: self.tasks.values().collect() };
        let text = match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(&document)?,
            OutputFormat::Compact => serde_json::to_string(&document)?,
        };
        Ok(text)
    }

    /// Decode from the versioned document format.
    ///
    /// Rejects any version other than the supported one, duplicate task
    /// IDs, and duplicate size keys within a task.
    pub fn from_json(text: &str) -> Result<ResultsStore, Error> {
        let document: DocumentRepr = serde_json::from_str(text)?;
        if document.version != VERSION {
            return Err(Error::UnsupportedVersion { found: document.version });
        }
        let entries = document
            .tasks
            .into_iter()
            .map(|repr| {
                let results = TaskResults::from_repr(repr)?;
                Ok((results.id().clone(), results))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let tasks = SortedMap::from_unique_pairs(entries)
            .map_err(|id| Error::DuplicateTask { id: id.to_string() })?;
        Ok(ResultsStore { tasks })
    }

    /// Load a store from a document on disk.
    pub fn load(path: &Path) -> Result<ResultsStore, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            context: format!("failed to read results from '{}'", path.display()),
            source,
        })?;
        ResultsStore::from_json(&text)
    }

    /// Load a store, treating a missing file as an empty store.
    pub fn load_or_empty(path: &Path) -> Result<ResultsStore, Error> {
        match std::fs::read_to_string(path) {
            Ok(text) => ResultsStore::from_json(&text),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Ok(ResultsStore::new())
            }
            Err(source) => Err(Error::Io {
                context: format!("failed to read results from '{}'", path.display()),
                source,
            }),
        }
    }

    /// Write the store to `path` in the given format.
    pub fn save(&self, path: &Path, format: OutputFormat) -> Result<(), Error> {
        let text = self.to_json(format)?;
        std::fs::write(path, text).map_err(|source| Error::Io {
            context: format!("failed to write results to '{}'", path.display()),
            source,
        })?;
        debug!(path = %path.display(), tasks = self.task_count(), "saved results");
        Ok(())
    }
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    version: i64,
    tasks: Vec<&'a TaskResults>,
}

#[derive(Deserialize)]
struct DocumentRepr {
    version: i64,
    #[serde(default)]
    tasks: Vec<TaskResultsRepr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> TaskID {
        text.parse().unwrap()
    }

    fn store_with(entries: &[(&str, u64, f64)]) -> ResultsStore {
        let mut store = ResultsStore::new();
        for &(task, size, micros) in entries {
            store.add(&id(task), Size::new(size), Time::microseconds(micros));
        }
        store
    }

    #[test]
    fn default_store_is_empty() {
        let store = ResultsStore::default();
        assert_eq!(store.task_count(), 0);
        assert_eq!(store.sample_count(), 0);
    }

    #[test]
    fn add_creates_tasks_and_samples_on_demand() {
        let store = store_with(&[("sum", 10, 1.0), ("sum", 10, 2.0), ("count", 20, 3.0)]);
        assert_eq!(store.task_count(), 2);
        assert_eq!(store.sample_count(), 3);
        assert_eq!(store.sample(&id("sum"), Size::new(10)).unwrap().count(), 2);
        assert!(store.sample(&id("sum"), Size::new(99)).is_none());
    }

    #[test]
    fn round_trip_preserves_everything() {
        let mut store = store_with(&[
            ("[std]append", 1, 0.25),
            ("[std]append", 1024, 3.5),
            ("sum", 1 << 20, 1750.0),
        ]);
        store
            .results_mut(&id("sum"))
            .set_link(Some("https://example.org/bench.rs#L10".to_string()));

        for format in [OutputFormat::Pretty, OutputFormat::Compact] {
            let text = store.to_json(format).unwrap();
            let decoded = ResultsStore::from_json(&text).unwrap();
            assert_eq!(decoded, store);
        }
    }

    #[test]
    fn document_shape_is_versioned() {
        let store = store_with(&[("sum", 10, 1.0)]);
        let json: serde_json::Value =
            serde_json::from_str(&store.to_json(OutputFormat::Compact).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json["tasks"][0]["results"]["10"].is_array());
    }

    #[test]
    fn unsupported_versions_are_corrupt() {
        let err = ResultsStore::from_json(r#"{ "version": 2, "tasks": [] }"#).unwrap_err();
        match err {
            Error::UnsupportedVersion { found } => assert_eq!(found, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn duplicate_task_ids_are_rejected() {
        let text = r#"{ "version": 1, "tasks": [
            { "title": "sum", "results": {} },
            { "title": "sum", "results": {} } ] }"#;
        match ResultsStore::from_json(text).unwrap_err() {
            Error::DuplicateTask { id } => assert_eq!(id, "sum"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn legacy_bare_seconds_times_decode() {
        let text = r#"{ "version": 1, "tasks": [
            { "title": "sum", "results": { "10": [0.5, 1] } } ] }"#;
        let store = ResultsStore::from_json(text).unwrap();
        let sample = store.sample(&id("sum"), Size::new(10)).unwrap();
        assert_eq!(sample.times(), &[Time::seconds(0.5), Time::seconds(1.0)]);
    }

    #[test]
    fn merge_is_sample_order_independent_but_link_is_not() {
        let mut a = store_with(&[("sum", 10, 1.0)]);
        a.results_mut(&id("sum")).set_link(Some("a".to_string()));
        let mut b = store_with(&[("sum", 10, 2.0), ("sum", 20, 3.0)]);
        b.results_mut(&id("sum")).set_link(Some("b".to_string()));

        let mut ab = ResultsStore::new();
        ab.merge(a.clone());
        ab.merge(b.clone());
        let mut ba = ResultsStore::new();
        ba.merge(b);
        ba.merge(a);

        for store in [&ab, &ba] {
            assert_eq!(store.sample(&id("sum"), Size::new(10)).unwrap().count(), 2);
            assert_eq!(store.sample(&id("sum"), Size::new(20)).unwrap().count(), 1);
        }
        assert_eq!(ab.results_for(&id("sum")).unwrap().link(), Some("b"));
        assert_eq!(ba.results_for(&id("sum")).unwrap().link(), Some("a"));
    }

    #[test]
    fn merge_modes() {
        let existing = store_with(&[("sum", 10, 1.0), ("count", 10, 2.0)]);
        let incoming = store_with(&[("sum", 10, 5.0)]);

        let mut appended = existing.clone();
        appended.merge_with_mode(incoming.clone(), MergeMode::Append);
        assert_eq!(appended.sample(&id("sum"), Size::new(10)).unwrap().count(), 2);
        assert_eq!(appended.task_count(), 2);

        let mut replaced = existing.clone();
        replaced.merge_with_mode(incoming.clone(), MergeMode::Replace);
        assert_eq!(replaced.sample(&id("sum"), Size::new(10)).unwrap().count(), 1);
        assert_eq!(replaced.task_count(), 2);

        let mut wiped = existing;
        wiped.merge_with_mode(incoming, MergeMode::ReplaceAll);
        assert_eq!(wiped.task_count(), 1);
    }

    #[test]
    fn bulk_removal() {
        let mut store = store_with(&[("sum", 10, 1.0), ("sum", 20, 2.0), ("count", 10, 3.0)]);
        store.clear_sizes(&[Size::new(10)], &[id("sum")]);
        assert!(store.sample(&id("sum"), Size::new(10)).is_none());
        assert!(store.sample(&id("count"), Size::new(10)).is_some());

        store.remove_tasks(&[id("count")]);
        assert!(!store.contains(&id("count")));

        store.clear();
        assert_eq!(store.task_count(), 1);
        assert_eq!(store.sample_count(), 0);
    }
}

//! The sample series collected for one task.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::sample::Sample;
use crate::size::Size;
use crate::sorted::SortedMap;
use crate::task::TaskID;
use crate::time::Time;

/// Samples taken at various sizes for one benchmark task, plus an optional
/// link to the task's source.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskResults {
    id: TaskID,
    link: Option<String>,
    samples: SortedMap<Size, Sample>,
}

impl TaskResults {
    pub fn new(id: TaskID) -> TaskResults {
        TaskResults { id, link: None, samples: SortedMap::new() }
    }

    pub fn id(&self) -> &TaskID {
        &self.id
    }

    /// URL of the task's source, when known.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn set_link(&mut self, link: Option<String>) {
        self.link = link;
    }

    /// The sample at `size`, if one was ever recorded.
    pub fn sample(&self, size: Size) -> Option<&Sample> {
        self.samples.get(&size)
    }

    /// (size, sample) pairs in ascending size order.
    pub fn samples(&self) -> impl Iterator<Item = (Size, &Sample)> {
        self.samples.iter().map(|(&size, sample)| (size, sample))
    }

    /// Sizes with at least one recorded sample, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = Size> + '_ {
        self.samples.keys().copied()
    }

    /// Total number of measurements across all sizes.
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Sample::count).sum()
    }

    /// Record one measurement.
    pub fn add(&mut self, size: Size, time: Time) {
        self.samples.get_or_insert_with(size, Sample::new).add(time);
    }

    /// Merge another run's samples for the same task.
    ///
    /// A receiver with no samples adopts the incoming series wholesale;
    /// otherwise samples are unioned per size. The link is not touched
    /// here; link resolution happens at the store level, where the incoming
    /// link always wins.
    pub fn merge(&mut self, other: TaskResults) {
        if self.samples.is_empty() {
            self.samples = other.samples;
            return;
        }
        for (size, sample) in other.samples {
            self.samples.get_or_insert_with(size, Sample::new).add_all(&sample);
        }
    }

    /// Drop the samples recorded at any of `sizes`.
    pub fn remove_sizes(&mut self, sizes: &[Size]) {
        self.samples.retain(|size, _| !sizes.contains(size));
    }

    /// Drop every sample, keeping the task entry itself.
    pub fn clear(&mut self) {
        self.samples = SortedMap::new();
    }
}

impl Serialize for TaskResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Results<'a>(&'a SortedMap<Size, Sample>);
        impl Serialize for Results<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_map(self.0.iter())
            }
        }

        let fields = 2 + usize::from(!self.id.label().is_empty()) + usize::from(self.link.is_some());
        let mut map = serializer.serialize_map(Some(fields))?;
        map.serialize_entry("title", self.id.title())?;
        if !self.id.label().is_empty() {
            map.serialize_entry("label", self.id.label())?;
        }
        if let Some(link) = &self.link {
            map.serialize_entry("link", link)?;
        }
        map.serialize_entry("results", &Results(&self.samples))?;
        map.end()
    }
}

/// Decoded shape of one task entry, before validation.
///
/// Sizes are kept as a pair list rather than a map so that duplicate size
/// keys in the document survive decoding and can be rejected with a typed
/// error in [`TaskResults::from_repr`].
#[derive(Deserialize)]
pub(crate) struct TaskResultsRepr {
    title: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default, deserialize_with = "sample_pairs")]
    results: Vec<(Size, Sample)>,
}

fn sample_pairs<'de, D>(deserializer: D) -> Result<Vec<(Size, Sample)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Pairs;
    impl<'de> Visitor<'de> for Pairs {
        type Value = Vec<(Size, Sample)>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a map from size keys to sample arrays")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(pair) = access.next_entry::<Size, Sample>()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }
    deserializer.deserialize_map(Pairs)
}

impl TaskResults {
    pub(crate) fn from_repr(repr: TaskResultsRepr) -> Result<TaskResults, Error> {
        let id = TaskID::checked(repr.label, repr.title)?;
        let samples = SortedMap::from_unique_pairs(repr.results).map_err(|size| {
            Error::DuplicateSize { task: id.to_string(), size: size.key_string() }
        })?;
        Ok(TaskResults { id, link: repr.link, samples })
    }
}

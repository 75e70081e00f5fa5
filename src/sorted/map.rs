//! A sorted keyed container with get-or-default semantics.

use std::collections::btree_map::{self, BTreeMap};

/// An ordered map from `K` to `V`, iterated in ascending key order.
///
/// Backed by a B-tree so stores with many keys keep logarithmic mutation
/// cost; the contract exposed here (ordering, keyed lookup, lazy defaults)
/// is what the rest of the crate depends on, not the backing structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedMap<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

// Not derived: the derive would also bound `K` and `V` on `Default`, which
// keys like task IDs don't (and shouldn't) implement.
impl<K: Ord, V> Default for SortedMap<K, V> {
    fn default() -> SortedMap<K, V> {
        SortedMap::new()
    }
}

impl<K: Ord, V> SortedMap<K, V> {
    /// Create an empty map.
    pub fn new() -> SortedMap<K, V> {
        SortedMap { entries: BTreeMap::new() }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Look up the value for `key`, mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// The value for `key`, lazily materializing `default()` on first
    /// access.
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        self.entries.entry(key).or_insert_with(default)
    }

    /// Set the value for `key`, returning the previous value if the key was
    /// already present.
    pub fn update(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool) {
        self.entries.retain(keep);
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    /// Iterate entries in ascending key order, with mutable values.
    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, K, V> {
        self.entries.iter_mut()
    }

    /// Iterate keys in ascending order.
    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    /// Iterate values in ascending key order.
    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.entries.values()
    }

    /// Iterate values in ascending key order, mutably.
    pub fn values_mut(&mut self) -> btree_map::ValuesMut<'_, K, V> {
        self.entries.values_mut()
    }

    /// Build from key-value pairs whose keys must all be distinct.
    ///
    /// On a collision the offending key is handed back so the caller can
    /// name it in a typed error.
    pub fn from_unique_pairs<I>(pairs: I) -> Result<SortedMap<K, V>, K>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = SortedMap::new();
        for (key, value) in pairs {
            if map.contains_key(&key) {
                return Err(key);
            }
            map.entries.insert(key, value);
        }
        Ok(map)
    }

    /// Build from key-value pairs, folding colliding values in input order
    /// with `combine(existing, incoming)`.
    pub fn from_pairs_combining<I>(pairs: I, mut combine: impl FnMut(&mut V, V)) -> SortedMap<K, V>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = SortedMap::new();
        for (key, value) in pairs {
            match map.entries.entry(key) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                btree_map::Entry::Occupied(slot) => combine(slot.into_mut(), value),
            }
        }
        map
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a SortedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Ord, V> IntoIterator for SortedMap<K, V> {
    type Item = (K, V);
    type IntoIter = btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_materializes_once() {
        let mut map: SortedMap<&str, Vec<i32>> = SortedMap::new();
        map.get_or_insert_with("a", Vec::new).push(1);
        map.get_or_insert_with("a", || panic!("default re-materialized")).push(2);
        assert_eq!(map.get(&"a"), Some(&vec![1, 2]));
    }

    #[test]
    fn update_returns_previous() {
        let mut map = SortedMap::new();
        assert_eq!(map.update("k", 1), None);
        assert_eq!(map.update("k", 2), Some(1));
        assert_eq!(map.get(&"k"), Some(&2));
    }

    #[test]
    fn iteration_is_ascending() {
        let mut map = SortedMap::new();
        for key in [30, 10, 20] {
            map.update(key, key * 10);
        }
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, [10, 20, 30]);
    }

    #[test]
    fn unique_pairs_reject_collisions() {
        let ok = SortedMap::from_unique_pairs([(1, "a"), (2, "b")]).unwrap();
        assert_eq!(ok.len(), 2);
        let err = SortedMap::from_unique_pairs([(1, "a"), (2, "b"), (1, "c")]);
        assert_eq!(err.unwrap_err(), 1);
    }

    #[test]
    fn combining_pairs_folds_in_input_order() {
        let map = SortedMap::from_pairs_combining(
            [(1, "a".to_string()), (1, "b".to_string()), (1, "c".to_string())],
            |acc, next| acc.push_str(&next),
        );
        assert_eq!(map.get(&1), Some(&"abc".to_string()));
    }

    #[test]
    fn default_requires_nothing_of_key_or_value() {
        #[derive(PartialEq, Eq, PartialOrd, Ord)]
        struct Bare(u32);

        let map: SortedMap<Bare, Bare> = SortedMap::default();
        assert!(map.is_empty());
    }

    #[test]
    fn retain_filters_entries() {
        let mut map = SortedMap::new();
        for key in 0..6 {
            map.update(key, ());
        }
        map.retain(|key, _| key % 2 == 0);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, [0, 2, 4]);
    }
}

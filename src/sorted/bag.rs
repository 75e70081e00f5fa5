//! A sorted multiset over a flat vector.

use std::ops::Range;

use super::search::{lower_bound, upper_bound};

/// A sorted bag: elements stay ascending, duplicates are allowed.
///
/// Single insertions binary-search for their position; bulk insertions
/// append and re-sort. Equal elements have no defined relative order after
/// a full re-sort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedBag<T: Ord> {
    elements: Vec<T>,
}

// Not derived, to avoid bounding `T` on `Default`.
impl<T: Ord> Default for SortedBag<T> {
    fn default() -> SortedBag<T> {
        SortedBag::new()
    }
}

impl<T: Ord> SortedBag<T> {
    /// Create an empty bag.
    pub fn new() -> SortedBag<T> {
        SortedBag { elements: Vec::new() }
    }

    /// Number of elements, counting duplicates.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the bag holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements in ascending order.
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Iterate the elements in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// The smallest element.
    pub fn first(&self) -> Option<&T> {
        self.elements.first()
    }

    /// The largest element.
    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    /// Insert `value` after any elements equal to it, keeping the bag
    /// sorted. Returns the index it landed at.
    pub fn insert(&mut self, value: T) -> usize {
        let index = upper_bound(&self.elements, &value);
        self.elements.insert(index, value);
        index
    }

    /// Insert every element of `values`: append, then fully re-sort.
    ///
    /// Cheaper than repeated single insertion when merging whole samples.
    pub fn insert_all<I: IntoIterator<Item = T>>(&mut self, values: I) {
        self.elements.extend(values);
        self.elements.sort();
    }

    /// Index of the first element equal to `value`, if present.
    pub fn first_index_of(&self, value: &T) -> Option<usize> {
        let index = lower_bound(&self.elements, value);
        (index < self.elements.len() && self.elements[index] == *value).then_some(index)
    }

    /// Index of the last element equal to `value`, if present.
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        let index = upper_bound(&self.elements, value);
        (index > 0 && self.elements[index - 1] == *value).then(|| index - 1)
    }

    /// The half-open index range of elements equal to `value`.
    ///
    /// Empty (with `start == end` at the insertion point) when absent; its
    /// length is the duplicate count.
    pub fn equal_range(&self, value: &T) -> Range<usize> {
        lower_bound(&self.elements, value)..upper_bound(&self.elements, value)
    }

    /// Whether any element equals `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.first_index_of(value).is_some()
    }
}

impl<T: Ord> FromIterator<T> for SortedBag<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> SortedBag<T> {
        let mut elements: Vec<T> = iter.into_iter().collect();
        elements.sort();
        SortedBag { elements }
    }
}

impl<'a, T: Ord> IntoIterator for &'a SortedBag<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

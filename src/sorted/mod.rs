//! Sorted containers backing sample storage and the results store.
//!
//! Two containers with deliberately small contracts:
//!
//! - [`SortedBag`]: a multiset over a flat sorted vector, with binary-search
//!   insertion that reports the insertion index and half-open ranges for
//!   duplicate runs. Samples per (task, size) pair stay small, so contiguous
//!   storage wins.
//! - [`SortedMap`]: a keyed container over a B-tree, so stores with many
//!   tasks × many sizes keep logarithmic mutation cost.

mod bag;
mod map;
pub(crate) mod search;

pub use bag::SortedBag;
pub use map::SortedMap;

//! Binary search primitives over sorted slices.

use std::cmp::Ordering;

/// Index of the first element not less than `needle`.
///
/// In a sorted slice this is where `needle` could be inserted while staying
/// sorted, before any equal elements.
pub(crate) fn lower_bound<T: Ord>(slice: &[T], needle: &T) -> usize {
    let mut start = 0;
    let mut end = slice.len();
    while start < end {
        let mid = start + (end - start) / 2;
        match slice[mid].cmp(needle) {
            Ordering::Less => start = mid + 1,
            _ => end = mid,
        }
    }
    start
}

/// Index of the first element greater than `needle`.
///
/// In a sorted slice this is where `needle` could be inserted while staying
/// sorted, after any equal elements.
pub(crate) fn upper_bound<T: Ord>(slice: &[T], needle: &T) -> usize {
    let mut start = 0;
    let mut end = slice.len();
    while start < end {
        let mid = start + (end - start) / 2;
        match slice[mid].cmp(needle) {
            Ordering::Greater => end = mid,
            _ => start = mid + 1,
        }
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_on_empty_slice() {
        let empty: [i32; 0] = [];
        assert_eq!(lower_bound(&empty, &1), 0);
        assert_eq!(upper_bound(&empty, &1), 0);
    }

    #[test]
    fn bounds_bracket_duplicate_runs() {
        let xs = [1, 3, 3, 3, 5, 7];
        assert_eq!(lower_bound(&xs, &3), 1);
        assert_eq!(upper_bound(&xs, &3), 4);
        assert_eq!(lower_bound(&xs, &0), 0);
        assert_eq!(upper_bound(&xs, &9), 6);
        assert_eq!(lower_bound(&xs, &4), 4);
        assert_eq!(upper_bound(&xs, &4), 4);
    }

    #[test]
    fn bounds_agree_with_linear_scan() {
        let xs = [0, 0, 2, 2, 2, 4, 8, 8, 16];
        for needle in 0..=17 {
            let expected_lower = xs.iter().position(|&x| x >= needle).unwrap_or(xs.len());
            let expected_upper = xs.iter().position(|&x| x > needle).unwrap_or(xs.len());
            assert_eq!(lower_bound(&xs, &needle), expected_lower);
            assert_eq!(upper_bound(&xs, &needle), expected_upper);
        }
    }
}

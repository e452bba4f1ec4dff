#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Suffix-array construction and search over unit streams.
//!
//! The matcher builds one suffix array over the old image's encoded view
//! and then, for every position of the new image, asks for the lower bound
//! of the new suffix among the old ones. Both operations work on plain
//! ordered slices, so this crate is generic over the unit type and carries
//! no opinion about how units are produced.

use std::cmp::Ordering;

/// Builds the suffix array of `text`: the start offsets of all suffixes,
/// sorted lexicographically.
///
/// Comparison-based construction; the matcher only requires correctness
/// and the [`suffix_lower_bound`] primitive, not linear-time construction.
#[must_use]
pub fn suffix_sort<T: Ord>(text: &[T]) -> Vec<u32> {
    let mut suffix_array: Vec<u32> = (0..text.len() as u32).collect();
    suffix_array.sort_unstable_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
    suffix_array
}

/// Returns the index into `suffix_array` of the first suffix of `text`
/// lexicographically greater than or equal to `query`.
///
/// Returns `suffix_array.len()` when every suffix compares below `query`.
#[must_use]
pub fn suffix_lower_bound<T: Ord>(suffix_array: &[u32], text: &[T], query: &[T]) -> usize {
    suffix_array
        .partition_point(|&start| text[start as usize..].cmp(query) == Ordering::Less)
}

//! crates/equivalence/src/map.rs
//!
//! Candidate generation across the new image and overlap resolution.

use index::{EncodedView, ImageIndex, Offset};

use crate::affinity::TargetsAffinity;
use crate::extend::visit_equivalence_seed;
use crate::score::{TokenSimilarity, equivalence_similarity};
use crate::types::{Equivalence, EquivalenceCandidate};

/// An ordered collection of scored alignments between two images.
///
/// A finalized map (one produced by [`EquivalenceMap::build`]) is sorted by
/// destination offset, its destination ranges are pairwise disjoint, and
/// every similarity is at least the minimum the caller supplied.
#[derive(Clone, Debug, Default)]
pub struct EquivalenceMap {
    candidates: Vec<EquivalenceCandidate>,
}

impl EquivalenceMap {
    /// Creates a map from existing candidates, sorted by destination.
    ///
    /// Meant for seeding affinity inference from an earlier pass; no
    /// overlap resolution is performed.
    #[must_use]
    pub fn new(candidates: Vec<EquivalenceCandidate>) -> Self {
        let mut map = Self { candidates };
        map.sort_by_destination();
        map
    }

    /// Builds the equivalence map between two encoded images.
    ///
    /// Scans the new image left to right; at each uncovered token position
    /// the old image's suffix array proposes source candidates, the best
    /// extension is kept, and the scan jumps past the accepted range. A
    /// final pruning pass resolves destination overlaps so the result is a
    /// non-overlapping, destination-sorted cover.
    ///
    /// `old_sa` must be the suffix array of `old_view`'s projection, and
    /// `affinities` must hold one oracle per pool of the images.
    #[must_use]
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            skip_all,
            fields(
                old_size = old_view.size(),
                new_size = new_view.size(),
                min_similarity = min_similarity
            ),
            name = "build_equivalence_map"
        )
    )]
    pub fn build(
        old_sa: &[u32],
        old_view: &EncodedView<'_>,
        new_view: &EncodedView<'_>,
        affinities: &[TargetsAffinity],
        min_similarity: f64,
    ) -> Self {
        debug_assert_eq!(old_sa.len(), old_view.size() as usize);

        let mut map = Self {
            candidates: create_candidates(old_sa, old_view, new_view, affinities, min_similarity),
        };
        map.sort_by_destination();
        map.prune(old_view, new_view, affinities, min_similarity);

        #[cfg(feature = "tracing")]
        {
            let coverage = map.covered_bytes();
            tracing::debug!(
                equivalences = map.len(),
                coverage,
                extra = new_view.size() - coverage,
                total = new_view.size(),
                "equivalence map built"
            );
        }
        map
    }

    /// Returns the candidates in destination order.
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &[EquivalenceCandidate] {
        &self.candidates
    }

    /// Returns an iterator over the candidates in destination order.
    pub fn iter(&self) -> std::slice::Iter<'_, EquivalenceCandidate> {
        self.candidates.iter()
    }

    /// Returns the number of candidates.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Reports whether the map holds no candidates.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Total number of new-image bytes covered by the candidates.
    #[must_use]
    pub fn covered_bytes(&self) -> Offset {
        self.candidates
            .iter()
            .map(|candidate| candidate.eq.length)
            .sum()
    }

    /// Strips similarities and re-sorts the alignments by source offset,
    /// the order downstream patch encoding walks the old image in.
    #[must_use]
    pub fn make_forward_equivalences(&self) -> Vec<Equivalence> {
        let mut equivalences: Vec<Equivalence> = self
            .candidates
            .iter()
            .map(|candidate| candidate.eq)
            .collect();
        equivalences.sort_unstable_by_key(|eq| eq.src_offset);
        equivalences
    }

    fn sort_by_destination(&mut self) {
        self.candidates
            .sort_by_key(|candidate| candidate.eq.dst_offset);
    }

    /// Resolves destination overlaps and drops candidates below the
    /// similarity floor.
    ///
    /// For each candidate in destination order: if a following overlapping
    /// candidate scores higher, the current one gives up the contested
    /// suffix; afterwards every remaining overlapping follower gives up
    /// the contested prefix. Shrunk candidates are re-scored over their
    /// reduced range and swept out if they fall below `min_similarity`.
    fn prune(
        &mut self,
        old_view: &EncodedView<'_>,
        new_view: &EncodedView<'_>,
        affinities: &[TargetsAffinity],
        min_similarity: f64,
    ) {
        let old_index = old_view.image_index();
        let new_index = new_view.image_index();

        for current in 0..self.candidates.len() {
            if self.candidates[current].similarity < min_similarity {
                continue; // Discarded by the sweep below anyway.
            }

            // Look ahead to resolve overlaps, until a better candidate is
            // found.
            for next in current + 1..self.candidates.len() {
                debug_assert!(
                    self.candidates[next].eq.dst_offset >= self.candidates[current].eq.dst_offset
                );
                if self.candidates[next].eq.dst_offset >= self.candidates[current].eq.dst_end() {
                    break; // No more overlap.
                }
                if self.candidates[current].similarity < self.candidates[next].similarity {
                    // |next| is better, so |current| shrinks.
                    let delta =
                        self.candidates[current].eq.dst_end() - self.candidates[next].eq.dst_offset;
                    self.candidates[current].eq.length -= delta;
                    self.candidates[current].similarity = scored_or_discard(
                        old_index,
                        new_index,
                        affinities,
                        self.candidates[current].eq,
                    );
                    break;
                }
            }

            // Shrink all overlapping candidates following and worse than
            // |current|.
            for next in current + 1..self.candidates.len() {
                let current_end = self.candidates[current].eq.dst_end();
                if self.candidates[next].eq.dst_offset >= current_end {
                    break; // No more overlap.
                }
                let delta = current_end - self.candidates[next].eq.dst_offset;
                let next_eq = &mut self.candidates[next].eq;
                next_eq.length = next_eq.length.saturating_sub(delta);
                next_eq.src_offset += delta;
                next_eq.dst_offset += delta;
                self.candidates[next].similarity =
                    scored_or_discard(old_index, new_index, affinities, self.candidates[next].eq);
                debug_assert_eq!(self.candidates[next].eq.dst_offset, current_end);
            }
        }

        self.candidates
            .retain(|candidate| candidate.similarity >= min_similarity);
    }
}

impl<'a> IntoIterator for &'a EquivalenceMap {
    type Item = &'a EquivalenceCandidate;
    type IntoIter = std::slice::Iter<'a, EquivalenceCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Range similarity as a plain score; an incompatible range scores below
/// any threshold so the sweep discards it.
fn scored_or_discard(
    old_index: &ImageIndex,
    new_index: &ImageIndex,
    affinities: &[TargetsAffinity],
    equivalence: Equivalence,
) -> f64 {
    match equivalence_similarity(old_index, new_index, affinities, equivalence) {
        TokenSimilarity::Scored(similarity) => similarity,
        TokenSimilarity::Incompatible => f64::NEG_INFINITY,
    }
}

/// Scans the new image in ascending destination order and collects the
/// best seed extension at every uncovered token position.
fn create_candidates(
    old_sa: &[u32],
    old_view: &EncodedView<'_>,
    new_view: &EncodedView<'_>,
    affinities: &[TargetsAffinity],
    min_similarity: f64,
) -> Vec<EquivalenceCandidate> {
    let old_index = old_view.image_index();
    let new_index = new_view.image_index();
    let mut candidates = Vec::new();

    let mut dst_offset: Offset = 0;
    while dst_offset < new_view.size() {
        if !new_view.is_token(dst_offset) {
            dst_offset += 1;
            continue;
        }
        let query = &new_view.projected()[dst_offset as usize..];
        let lower_bound = suffix::suffix_lower_bound(old_sa, old_view.projected(), query);

        let mut next_dst_offset = dst_offset + 1;
        let mut best_similarity = min_similarity;
        let mut best_candidate = EquivalenceCandidate::new(Equivalence::new(0, 0, 0), 0.0);

        // Suffix-array neighbors are lexicographically close to the query,
        // and alignment quality falls off quickly past the best match, so
        // both walks stop at the first seed that fails to improve.
        for &src in &old_sa[lower_bound..] {
            let candidate = visit_equivalence_seed(
                old_index,
                new_index,
                affinities,
                src,
                dst_offset,
                min_similarity,
            );
            if candidate.similarity > best_similarity {
                best_similarity = candidate.similarity;
                next_dst_offset = candidate.eq.dst_end();
                best_candidate = candidate;
            } else {
                break;
            }
        }
        for &src in old_sa[..lower_bound].iter().rev() {
            let candidate = visit_equivalence_seed(
                old_index,
                new_index,
                affinities,
                src,
                dst_offset,
                min_similarity,
            );
            if candidate.similarity > best_similarity {
                best_similarity = candidate.similarity;
                next_dst_offset = candidate.eq.dst_end();
                best_candidate = candidate;
            } else {
                break;
            }
        }

        if best_candidate.similarity >= min_similarity {
            candidates.push(best_candidate);
        }
        dst_offset = next_dst_offset;
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{make_affinities, make_image_index};

    fn candidate(src: Offset, dst: Offset, length: Offset, similarity: f64) -> EquivalenceCandidate {
        EquivalenceCandidate::new(Equivalence::new(src, dst, length), similarity)
    }

    #[test]
    fn new_sorts_by_destination() {
        let map = EquivalenceMap::new(vec![
            candidate(1, 4, 1, 0.0),
            candidate(0, 0, 1, 0.0),
            candidate(2, 2, 1, 0.0),
        ]);
        let destinations: Vec<Offset> = map.iter().map(|c| c.eq.dst_offset).collect();
        assert_eq!(destinations, vec![0, 2, 4]);
    }

    #[test]
    fn forward_equivalences_of_empty_map() {
        assert_eq!(
            EquivalenceMap::default().make_forward_equivalences(),
            Vec::new()
        );
    }

    #[test]
    fn forward_equivalences_keep_disjoint_order() {
        let map = EquivalenceMap::new(vec![candidate(0, 0, 1, 0.0), candidate(1, 1, 1, 0.0)]);
        assert_eq!(
            map.make_forward_equivalences(),
            vec![Equivalence::new(0, 0, 1), Equivalence::new(1, 1, 1)]
        );
    }

    #[test]
    fn forward_equivalences_resort_by_source() {
        let map = EquivalenceMap::new(vec![candidate(1, 0, 1, 0.0), candidate(0, 1, 1, 0.0)]);
        assert_eq!(
            map.make_forward_equivalences(),
            vec![Equivalence::new(0, 1, 1), Equivalence::new(1, 0, 1)]
        );

        let map = EquivalenceMap::new(vec![
            candidate(1, 0, 1, 0.0),
            candidate(4, 1, 1, 0.0),
            candidate(0, 2, 1, 0.0),
        ]);
        assert_eq!(
            map.make_forward_equivalences(),
            vec![
                Equivalence::new(0, 2, 1),
                Equivalence::new(1, 0, 1),
                Equivalence::new(4, 1, 1)
            ]
        );
    }

    #[test]
    fn covered_bytes_sums_lengths() {
        let map = EquivalenceMap::new(vec![candidate(0, 0, 3, 0.0), candidate(4, 4, 2, 0.0)]);
        assert_eq!(map.covered_bytes(), 5);
    }

    #[test]
    fn prune_truncates_a_worse_follower() {
        let old_index = make_image_index("banana", vec![], vec![]);
        let new_index = make_image_index("banana", vec![], vec![]);
        let affinities = make_affinities(&old_index, &new_index, &EquivalenceMap::default());
        let old_view = EncodedView::new(&old_index);
        let new_view = EncodedView::new(&new_index);

        let mut map = EquivalenceMap::new(vec![
            candidate(0, 0, 4, 4.0),
            candidate(2, 2, 4, 4.0),
        ]);
        map.prune(&old_view, &new_view, &affinities, 4.0);

        // The follower loses the contested prefix, drops below the floor
        // over its remaining two bytes, and is swept out.
        assert_eq!(map.len(), 1);
        assert_eq!(map.candidates()[0].eq, Equivalence::new(0, 0, 4));
    }

    #[test]
    fn prune_shrinks_current_when_follower_is_better() {
        let old_index = make_image_index("banana", vec![], vec![]);
        let new_index = make_image_index("banana", vec![], vec![]);
        let affinities = make_affinities(&old_index, &new_index, &EquivalenceMap::default());
        let old_view = EncodedView::new(&old_index);
        let new_view = EncodedView::new(&new_index);

        let mut map = EquivalenceMap::new(vec![
            candidate(0, 0, 4, 4.0),
            candidate(2, 2, 4, 5.0),
        ]);
        map.prune(&old_view, &new_view, &affinities, 4.0);

        // The current candidate gives up the contested suffix, scores 2.0
        // over its remainder, and is swept out; the better follower stays
        // intact.
        assert_eq!(map.len(), 1);
        assert_eq!(map.candidates()[0].eq, Equivalence::new(2, 2, 4));
        assert_eq!(map.candidates()[0].similarity, 5.0);
    }

    #[test]
    fn prune_keeps_non_overlapping_candidates() {
        let old_index = make_image_index("banana", vec![], vec![]);
        let new_index = make_image_index("banana", vec![], vec![]);
        let affinities = make_affinities(&old_index, &new_index, &EquivalenceMap::default());
        let old_view = EncodedView::new(&old_index);
        let new_view = EncodedView::new(&new_index);

        let mut map = EquivalenceMap::new(vec![
            candidate(0, 0, 3, 4.0),
            candidate(3, 3, 3, 4.0),
        ]);
        map.prune(&old_view, &new_view, &affinities, 4.0);
        assert_eq!(map.len(), 2);
        assert_eq!(map.covered_bytes(), 6);
    }
}

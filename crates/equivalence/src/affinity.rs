//! crates/equivalence/src/affinity.rs
//!
//! Per-pool association oracle between old and new reference targets.

use index::Offset;

use crate::map::EquivalenceMap;

/// One side of a mutual target association.
#[derive(Clone, Copy, Debug, Default)]
struct Association {
    /// Key of the associated target on the other side.
    other: u32,
    /// Strength of the association; `0.0` means unassociated.
    affinity: f64,
}

/// Tracks which old and new targets of one pool are believed to be the
/// same logical entity.
///
/// Associations are inferred from a previously built [`EquivalenceMap`],
/// which lets earlier matching passes bootstrap confidence for later ones:
/// an equivalence covering an old target projects it to a new offset, and
/// if a new target sits exactly there the two are associated with the
/// equivalence's similarity as strength. Keys index the pool's sorted
/// target lists.
#[derive(Clone, Debug, Default)]
pub struct TargetsAffinity {
    forward: Vec<Association>,
    backward: Vec<Association>,
}

impl TargetsAffinity {
    /// Creates an oracle with no targets on either side.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derives all associations from `equivalences`.
    ///
    /// `old_targets` and `new_targets` are the pool's sorted target offset
    /// lists. Candidates are visited in decreasing similarity order, so
    /// each target keeps its strongest association.
    pub fn infer_from_similarities(
        &mut self,
        equivalences: &EquivalenceMap,
        old_targets: &[Offset],
        new_targets: &[Offset],
    ) {
        self.forward = vec![Association::default(); old_targets.len()];
        self.backward = vec![Association::default(); new_targets.len()];

        let mut candidates = equivalences.candidates().to_vec();
        candidates.sort_unstable_by(|a, b| b.similarity.total_cmp(&a.similarity));

        for candidate in &candidates {
            let eq = candidate.eq;
            let first = old_targets.partition_point(|&target| target < eq.src_offset);
            for (old_key, &old_target) in old_targets.iter().enumerate().skip(first) {
                if old_target >= eq.src_end() {
                    break;
                }
                let projected = old_target - eq.src_offset + eq.dst_offset;
                let Ok(new_key) = new_targets.binary_search(&projected) else {
                    continue;
                };
                if self.forward[old_key].affinity < candidate.similarity
                    && self.backward[new_key].affinity < candidate.similarity
                {
                    self.forward[old_key] = Association {
                        other: new_key as u32,
                        affinity: candidate.similarity,
                    };
                    self.backward[new_key] = Association {
                        other: old_key as u32,
                        affinity: candidate.similarity,
                    };
                }
            }
        }
    }

    /// Returns the affinity between an old and a new target.
    ///
    /// Positive when the two are associated with each other (the
    /// association strength), `0.0` when neither is associated, and
    /// negative when either is associated with a different counterpart.
    #[must_use]
    pub fn affinity_between(&self, old_key: u32, new_key: u32) -> f64 {
        let forward = self.forward[old_key as usize];
        let backward = self.backward[new_key as usize];
        if forward.affinity > 0.0 && forward.other == new_key {
            debug_assert_eq!(backward.other, old_key);
            return forward.affinity;
        }
        -forward.affinity.max(backward.affinity)
    }

    /// Gives each association at least `min_affinity` strong a shared
    /// non-zero label; unassociated targets get label `0`.
    ///
    /// Returns the old-side labels, the new-side labels, and the exclusive
    /// label bound, for injection into both encoded views.
    #[must_use]
    pub fn assign_labels(&self, min_affinity: f64) -> (Vec<u32>, Vec<u32>, u32) {
        debug_assert!(min_affinity > 0.0);
        let mut old_labels = vec![0_u32; self.forward.len()];
        let mut new_labels = vec![0_u32; self.backward.len()];
        let mut label = 1_u32;
        for (old_key, association) in self.forward.iter().enumerate() {
            if association.affinity >= min_affinity {
                old_labels[old_key] = label;
                new_labels[association.other as usize] = label;
                label += 1;
            }
        }
        (old_labels, new_labels, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Equivalence, EquivalenceCandidate};

    fn map(candidates: Vec<(Equivalence, f64)>) -> EquivalenceMap {
        EquivalenceMap::new(
            candidates
                .into_iter()
                .map(|(eq, similarity)| EquivalenceCandidate::new(eq, similarity))
                .collect(),
        )
    }

    #[test]
    fn no_equivalences_leaves_everything_unassociated() {
        let mut affinity = TargetsAffinity::new();
        affinity.infer_from_similarities(&EquivalenceMap::default(), &[0, 4], &[1, 5]);
        assert_eq!(affinity.affinity_between(0, 0), 0.0);
        assert_eq!(affinity.affinity_between(1, 1), 0.0);
    }

    #[test]
    fn covered_targets_associate_through_the_alignment() {
        let mut affinity = TargetsAffinity::new();
        // Equivalence (2, 10, 4) projects old target 3 onto new target 11.
        affinity.infer_from_similarities(
            &map(vec![(Equivalence::new(2, 10, 4), 5.0)]),
            &[3, 8],
            &[11, 20],
        );
        assert_eq!(affinity.affinity_between(0, 0), 5.0);
        // Either side being claimed elsewhere reads as a contradiction.
        assert_eq!(affinity.affinity_between(0, 1), -5.0);
        assert_eq!(affinity.affinity_between(1, 0), -5.0);
        // Both sides unassociated stays neutral.
        assert_eq!(affinity.affinity_between(1, 1), 0.0);
    }

    #[test]
    fn stronger_equivalences_claim_contested_targets() {
        let mut affinity = TargetsAffinity::new();
        // Both equivalences project old target 0 onto a new target; the
        // higher-similarity one wins regardless of map order.
        affinity.infer_from_similarities(
            &map(vec![
                (Equivalence::new(0, 0, 2), 1.0),
                (Equivalence::new(0, 4, 2), 3.0),
            ]),
            &[0],
            &[0, 4],
        );
        assert_eq!(affinity.affinity_between(0, 1), 3.0);
        assert_eq!(affinity.affinity_between(0, 0), -3.0);
    }

    #[test]
    fn targets_outside_the_alignment_stay_unassociated() {
        let mut affinity = TargetsAffinity::new();
        affinity.infer_from_similarities(
            &map(vec![(Equivalence::new(2, 10, 4), 5.0)]),
            &[7],
            &[15],
        );
        assert_eq!(affinity.affinity_between(0, 0), 0.0);
    }

    #[test]
    fn projected_offset_without_a_target_stays_unassociated() {
        let mut affinity = TargetsAffinity::new();
        // Old target 3 projects to 11, but the new pool only has 12.
        affinity.infer_from_similarities(
            &map(vec![(Equivalence::new(2, 10, 4), 5.0)]),
            &[3],
            &[12],
        );
        assert_eq!(affinity.affinity_between(0, 0), 0.0);
    }

    #[test]
    fn labels_are_shared_per_association() {
        let mut affinity = TargetsAffinity::new();
        affinity.infer_from_similarities(
            &map(vec![
                (Equivalence::new(0, 0, 2), 4.0),
                (Equivalence::new(8, 8, 2), 2.0),
            ]),
            &[0, 8],
            &[0, 8],
        );
        let (old_labels, new_labels, bound) = affinity.assign_labels(1.0);
        assert_eq!(old_labels, vec![1, 2]);
        assert_eq!(new_labels, vec![1, 2]);
        assert_eq!(bound, 3);

        // A higher floor drops the weaker association.
        let (old_labels, new_labels, bound) = affinity.assign_labels(3.0);
        assert_eq!(old_labels, vec![1, 0]);
        assert_eq!(new_labels, vec![1, 0]);
        assert_eq!(bound, 2);
    }

    #[test]
    fn labels_default_to_zero_without_associations() {
        let mut affinity = TargetsAffinity::new();
        affinity.infer_from_similarities(&EquivalenceMap::default(), &[0, 1], &[2]);
        let (old_labels, new_labels, bound) = affinity.assign_labels(1.0);
        assert_eq!(old_labels, vec![0, 0]);
        assert_eq!(new_labels, vec![0]);
        assert_eq!(bound, 1);
    }
}

//! crates/equivalence/src/score.rs
//!
//! Token and range similarity between positions of the two images.

use index::{ImageIndex, Offset};

use crate::affinity::TargetsAffinity;
use crate::types::Equivalence;

/// Outcome of comparing one position of the old image against one position
/// of the new image.
///
/// A type mismatch is not a low score: it is a hard boundary that must stop
/// any further exploration of the pairing, so it gets its own variant
/// instead of a sentinel value that could leak into arithmetic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenSimilarity {
    /// The positions are comparable; higher is better.
    Scored(f64),
    /// The positions hold different content types; never traversable.
    Incompatible,
}

/// Compares the tokens at `src` (old image) and `dst` (new image).
///
/// Raw bytes compare by value. References compare by the affinity of their
/// targets: associated targets score a full reference width, unassociated
/// ones half of it, and targets associated with different counterparts
/// score a mismatch. Both positions must be token-aligned.
#[must_use]
pub fn token_similarity(
    old_index: &ImageIndex,
    new_index: &ImageIndex,
    affinities: &[TargetsAffinity],
    src: Offset,
    dst: Offset,
) -> TokenSimilarity {
    debug_assert!(old_index.is_token(src));
    debug_assert!(new_index.is_token(dst));

    let old_type = old_index.type_at(src);
    if old_type != new_index.type_at(dst) {
        return TokenSimilarity::Incompatible;
    }

    // Raw comparison.
    let Some(type_tag) = old_type else {
        let score = if old_index.byte_at(src) == new_index.byte_at(dst) {
            1.0
        } else {
            -1.5
        };
        return TokenSimilarity::Scored(score);
    };

    let old_refs = old_index.refs(type_tag);
    let new_refs = new_index.refs(type_tag);
    let pool_tag = old_refs.pool_tag();
    let affinity = affinities[usize::from(pool_tag.value())].affinity_between(
        old_refs.at(src).target_key,
        new_refs.at(dst).target_key,
    );

    let width = f64::from(old_refs.width());
    // Neither target associated yet implies a weak match; an association
    // either confirms or contradicts the pairing.
    let score = if affinity > 0.0 {
        width
    } else if affinity == 0.0 {
        0.5 * width
    } else {
        -2.0
    };
    TokenSimilarity::Scored(score)
}

/// Sums token similarity over every token-aligned offset of `equivalence`.
///
/// Non-token positions (trailing bytes of a multi-byte reference) are
/// skipped; they are attributed to the preceding token. Used to recompute a
/// candidate's score after pruning shrinks its range.
#[must_use]
pub fn equivalence_similarity(
    old_index: &ImageIndex,
    new_index: &ImageIndex,
    affinities: &[TargetsAffinity],
    equivalence: Equivalence,
) -> TokenSimilarity {
    let mut similarity = 0.0;
    for k in 0..equivalence.length {
        if !new_index.is_token(equivalence.dst_offset + k) {
            continue;
        }
        match token_similarity(
            old_index,
            new_index,
            affinities,
            equivalence.src_offset + k,
            equivalence.dst_offset + k,
        ) {
            TokenSimilarity::Scored(score) => similarity += score,
            TokenSimilarity::Incompatible => return TokenSimilarity::Incompatible,
        }
    }
    TokenSimilarity::Scored(similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::EquivalenceMap;
    use crate::testing::{make_affinities, make_image_index};
    use crate::types::EquivalenceCandidate;

    #[test]
    fn token_similarity_cases() {
        let old_index = make_image_index(
            "ab1122334455",
            vec![(2, 0), (4, 1), (6, 2), (8, 2)],
            vec![(10, 3)],
        );
        // Note: {4, 1} -> {6, 3} and {6, 2} -> {4, 1} below, then sorted.
        let new_index = make_image_index(
            "a11b33224455",
            vec![(1, 0), (4, 1), (6, 3), (8, 1)],
            vec![(10, 2)],
        );
        let affinities = make_affinities(
            &old_index,
            &new_index,
            &EquivalenceMap::new(vec![
                EquivalenceCandidate::new(Equivalence::new(0, 0, 1), 1.0),
                EquivalenceCandidate::new(Equivalence::new(1, 3, 1), 1.0),
            ]),
        );
        let similarity =
            |src, dst| token_similarity(&old_index, &new_index, &affinities, src, dst);

        // Raw match and raw mismatch.
        assert_eq!(similarity(0, 0), TokenSimilarity::Scored(1.0));
        assert_eq!(similarity(1, 0), TokenSimilarity::Scored(-1.5));

        // Type mismatches are hard boundaries.
        assert_eq!(similarity(0, 1), TokenSimilarity::Incompatible);
        assert_eq!(similarity(2, 0), TokenSimilarity::Incompatible);
        assert_eq!(similarity(2, 10), TokenSimilarity::Incompatible);
        assert_eq!(similarity(10, 1), TokenSimilarity::Incompatible);

        // Reference strong matches score the full reference width.
        assert_eq!(similarity(2, 1), TokenSimilarity::Scored(2.0));
        assert_eq!(similarity(4, 6), TokenSimilarity::Scored(2.0));

        // Unassociated targets score a weak match, below a strong one.
        assert_eq!(similarity(6, 4), TokenSimilarity::Scored(1.0));
        assert_eq!(similarity(6, 8), TokenSimilarity::Scored(1.0));
        assert_eq!(similarity(8, 4), TokenSimilarity::Scored(1.0));

        // Targets associated with different counterparts mismatch.
        assert_eq!(similarity(2, 4), TokenSimilarity::Scored(-2.0));
        assert_eq!(similarity(2, 6), TokenSimilarity::Scored(-2.0));
    }

    #[test]
    fn range_similarity_sums_token_scores() {
        let image_index = make_image_index("abcdef1122", vec![(6, 0)], vec![(8, 1)]);
        let affinities =
            make_affinities(&image_index, &image_index, &EquivalenceMap::default());
        let similarity = |eq| {
            equivalence_similarity(&image_index, &image_index, &affinities, eq)
        };

        // Length-0 equivalences are no-ops wherever they sit.
        assert_eq!(similarity(Equivalence::new(0, 0, 0)), TokenSimilarity::Scored(0.0));
        assert_eq!(similarity(Equivalence::new(0, 3, 0)), TokenSimilarity::Scored(0.0));
        assert_eq!(similarity(Equivalence::new(3, 0, 0)), TokenSimilarity::Scored(0.0));

        // Aligned raw ranges sum their byte matches.
        assert_eq!(similarity(Equivalence::new(0, 0, 3)), TokenSimilarity::Scored(3.0));
        assert_eq!(similarity(Equivalence::new(0, 3, 3)), TokenSimilarity::Scored(-4.5));
        assert_eq!(similarity(Equivalence::new(3, 0, 3)), TokenSimilarity::Scored(-4.5));

        // Two unassociated references: weak match each, trailing bytes
        // skipped.
        assert_eq!(similarity(Equivalence::new(6, 6, 4)), TokenSimilarity::Scored(2.0));
    }
}

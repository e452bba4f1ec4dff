//! crates/equivalence/src/extend.rs
//!
//! Greedy bidirectional extension of candidate alignments.

use index::{ImageIndex, Offset};

use crate::affinity::TargetsAffinity;
use crate::score::{TokenSimilarity, token_similarity};
use crate::types::EquivalenceCandidate;

/// Extends `candidate` forward one position at a time and returns the
/// best-scoring extent found.
///
/// The walk keeps a running similarity and a decaying mismatch budget and
/// stops on a type boundary, when the running similarity turns negative, or
/// when the budget is exhausted. The penalty starts at `min_similarity`:
/// the seed itself is already a forward match, so a run of mismatches right
/// after it gets little tolerance.
#[must_use]
pub fn extend_equivalence_forward(
    old_index: &ImageIndex,
    new_index: &ImageIndex,
    affinities: &[TargetsAffinity],
    candidate: EquivalenceCandidate,
    min_similarity: f64,
) -> EquivalenceCandidate {
    let mut eq = candidate.eq;
    let mut best_k = eq.length;
    let mut current_similarity = candidate.similarity;
    let mut best_similarity = current_similarity;
    let mut current_penalty = min_similarity;

    let limit = (old_index.size() - eq.src_offset).min(new_index.size() - eq.dst_offset);
    for k in best_k..limit {
        // Mismatch in type: the candidate cannot be extended further.
        if old_index.type_at(eq.src_offset + k) != new_index.type_at(eq.dst_offset + k) {
            break;
        }

        if !new_index.is_token(eq.dst_offset + k) {
            // Non-tokens are joined with the nearest previous token: skip
            // until the unit is covered, and absorb it into the accepted
            // range if the range is flush with the probe.
            if best_k == k {
                best_k = k + 1;
            }
            continue;
        }

        let TokenSimilarity::Scored(similarity) = token_similarity(
            old_index,
            new_index,
            affinities,
            eq.src_offset + k,
            eq.dst_offset + k,
        ) else {
            break;
        };
        current_similarity += similarity;
        current_penalty = current_penalty.max(0.0) - similarity;

        if current_similarity < 0.0 || current_penalty >= min_similarity {
            break;
        }
        if current_similarity >= best_similarity {
            best_similarity = current_similarity;
            best_k = k + 1;
        }
    }

    eq.length = best_k;
    EquivalenceCandidate::new(eq, best_similarity)
}

/// Extends `candidate` backward one position at a time and returns the
/// best-scoring extent found.
///
/// Mirror of [`extend_equivalence_forward`], except the penalty starts at
/// `0.0`: backward extension explores genuinely new territory, so the full
/// mismatch budget is available from the start.
#[must_use]
pub fn extend_equivalence_backward(
    old_index: &ImageIndex,
    new_index: &ImageIndex,
    affinities: &[TargetsAffinity],
    candidate: EquivalenceCandidate,
    min_similarity: f64,
) -> EquivalenceCandidate {
    let mut eq = candidate.eq;
    let mut best_k: Offset = 0;
    let mut current_similarity = candidate.similarity;
    let mut best_similarity = current_similarity;
    let mut current_penalty = 0.0_f64;

    let limit = eq.src_offset.min(eq.dst_offset);
    for k in 1..=limit {
        // Mismatch in type: the candidate cannot be extended further.
        if old_index.type_at(eq.src_offset - k) != new_index.type_at(eq.dst_offset - k) {
            break;
        }

        // Non-tokens are joined with the nearest previous token: skip
        // until the next token is reached.
        if !new_index.is_token(eq.dst_offset - k) {
            continue;
        }

        let TokenSimilarity::Scored(similarity) = token_similarity(
            old_index,
            new_index,
            affinities,
            eq.src_offset - k,
            eq.dst_offset - k,
        ) else {
            break;
        };
        current_similarity += similarity;
        current_penalty = current_penalty.max(0.0) - similarity;

        if current_similarity < 0.0 || current_penalty >= min_similarity {
            break;
        }
        if current_similarity >= best_similarity {
            best_similarity = current_similarity;
            best_k = k;
        }
    }

    eq.src_offset -= best_k;
    eq.dst_offset -= best_k;
    eq.length += best_k;
    EquivalenceCandidate::new(eq, best_similarity)
}

/// Turns a single `(src, dst)` seed pair into a scored candidate.
///
/// A non-token source yields an empty candidate. Forward extension runs
/// first; if it cannot reach `min_similarity` the seed is abandoned without
/// backward extension, since backward growth can only help once the forward
/// pass clears the bar.
#[must_use]
pub fn visit_equivalence_seed(
    old_index: &ImageIndex,
    new_index: &ImageIndex,
    affinities: &[TargetsAffinity],
    src: Offset,
    dst: Offset,
    min_similarity: f64,
) -> EquivalenceCandidate {
    let candidate = EquivalenceCandidate::new(crate::types::Equivalence::new(src, dst, 0), 0.0);
    if !old_index.is_token(src) {
        return candidate;
    }
    let candidate =
        extend_equivalence_forward(old_index, new_index, affinities, candidate, min_similarity);
    if candidate.similarity < min_similarity {
        return candidate; // Not worth exploring any more.
    }
    extend_equivalence_backward(old_index, new_index, affinities, candidate, min_similarity)
}

#![deny(unsafe_code)]

//! Equivalence-map construction for binary delta patching.
//!
//! Given a tokenized old image and a tokenized new image, this crate finds
//! equivalences: pairs of byte ranges, one in each image, similar enough to
//! be encoded as copy-with-small-edits patch instructions instead of
//! verbatim bytes.
//!
//! - [`token_similarity`] compares one position of each image, scoring
//!   references by the affinity of their targets instead of raw bytes
//! - [`extend_equivalence_forward`] / [`extend_equivalence_backward`] grow
//!   a seed alignment greedily under a noise-tolerance budget
//! - [`EquivalenceMap::build`] drives suffix-array seeding across the new
//!   image and resolves overlaps into a sorted, disjoint cover
//! - [`EquivalenceMap::make_forward_equivalences`] re-orders the result
//!   for consumers that walk the old image
//! - [`TargetsAffinity`] is the per-pool oracle linking old and new
//!   reference targets, bootstrapped from earlier matching passes
//!
//! # Design
//!
//! The matcher operates on the `index` crate's [`index::EncodedView`]s and
//! a suffix array from the `suffix` crate. "No equivalence found" for a
//! region is an expected outcome, not an error; the only failure modes are
//! construction-time contract violations, which assert.

mod affinity;
mod extend;
mod map;
mod score;
mod types;

pub use affinity::TargetsAffinity;
pub use extend::{
    extend_equivalence_backward, extend_equivalence_forward, visit_equivalence_seed,
};
pub use map::EquivalenceMap;
pub use score::{TokenSimilarity, equivalence_similarity, token_similarity};
pub use types::{Equivalence, EquivalenceCandidate};

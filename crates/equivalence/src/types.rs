//! crates/equivalence/src/types.rs
//!
//! Alignment types produced by the matcher.

use index::Offset;

/// An alignment claiming that `length` bytes of the old image starting at
/// `src_offset` correspond to `length` bytes of the new image starting at
/// `dst_offset`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Equivalence {
    /// Start of the aligned range in the old image.
    pub src_offset: Offset,
    /// Start of the aligned range in the new image.
    pub dst_offset: Offset,
    /// Length of both ranges in bytes.
    pub length: Offset,
}

impl Equivalence {
    /// Creates an equivalence.
    #[must_use]
    pub const fn new(src_offset: Offset, dst_offset: Offset, length: Offset) -> Self {
        Self {
            src_offset,
            dst_offset,
            length,
        }
    }

    /// End of the aligned range in the old image (exclusive).
    #[inline]
    #[must_use]
    pub const fn src_end(self) -> Offset {
        self.src_offset + self.length
    }

    /// End of the aligned range in the new image (exclusive).
    #[inline]
    #[must_use]
    pub const fn dst_end(self) -> Offset {
        self.dst_offset + self.length
    }
}

/// An [`Equivalence`] paired with the similarity of its aligned ranges.
///
/// Higher similarity is better. Candidates below a caller-supplied minimum
/// are discarded before a map is finalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquivalenceCandidate {
    /// The aligned ranges.
    pub eq: Equivalence,
    /// Summed token similarity over the aligned ranges.
    pub similarity: f64,
}

impl EquivalenceCandidate {
    /// Creates a candidate.
    #[must_use]
    pub const fn new(eq: Equivalence, similarity: f64) -> Self {
        Self { eq, similarity }
    }
}

//! crates/index/src/encoded.rs
//!
//! Label-projected view of an image for suffix sorting and seed search.

use crate::image::ImageIndex;
use crate::tags::{Offset, PoolTag};

/// Unit shared by all non-token positions (trailing reference bytes).
const NON_TOKEN_UNIT: u32 = 256;

/// First unit of the reference-token range; raw bytes occupy `0..=255`.
const BASE_REFERENCE_UNIT: u32 = 257;

#[derive(Clone, Debug)]
struct PoolLabels {
    /// Label per target key; targets without an entry are unlabeled (`0`).
    labels: Vec<u32>,
    /// Exclusive upper bound on label values.
    bound: u32,
}

impl Default for PoolLabels {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            bound: 1,
        }
    }
}

/// An image projected into a stream of comparable units.
///
/// Raw bytes project to their own value, trailing reference bytes to a
/// shared non-token unit, and reference tokens to a per-type block indexed
/// by the label of their target. Unlabeled references of the same type all
/// project to the same unit, so lexicographic comparison treats them as
/// interchangeable; labels injected via [`EncodedView::set_labels`] split
/// that block by associated target.
///
/// Views compared against each other (for suffix search) must be built over
/// images sharing one reference type universe and be given label bounds
/// from the same assignment.
#[derive(Clone, Debug)]
pub struct EncodedView<'a> {
    index: &'a ImageIndex,
    pools: Vec<PoolLabels>,
    projected: Vec<u32>,
}

impl<'a> EncodedView<'a> {
    /// Creates a view with every reference unlabeled.
    #[must_use]
    pub fn new(index: &'a ImageIndex) -> Self {
        let mut view = Self {
            index,
            pools: vec![PoolLabels::default(); index.pool_count()],
            projected: Vec::new(),
        };
        view.project();
        view
    }

    /// Injects per-target labels for one pool and re-projects the view.
    ///
    /// `labels` is indexed by target key; values must be below
    /// `label_bound`. Both views of a matching pass must receive the bound
    /// returned by the same label assignment.
    pub fn set_labels(&mut self, pool_tag: PoolTag, labels: Vec<u32>, label_bound: u32) {
        debug_assert!(label_bound >= 1);
        debug_assert!(labels.iter().all(|&label| label < label_bound));
        self.pools[usize::from(pool_tag.value())] = PoolLabels {
            labels,
            bound: label_bound,
        };
        self.project();
    }

    /// Returns the image size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Offset {
        self.index.size()
    }

    /// Reports whether `offset` starts a token.
    #[inline]
    #[must_use]
    pub fn is_token(&self, offset: Offset) -> bool {
        self.index.is_token(offset)
    }

    /// Returns the projected unit stream.
    #[inline]
    #[must_use]
    pub fn projected(&self) -> &[u32] {
        &self.projected
    }

    /// Returns the exclusive upper bound on projected unit values.
    #[must_use]
    pub fn cardinality(&self) -> u32 {
        BASE_REFERENCE_UNIT + self.type_span() * self.label_space()
    }

    /// Returns the underlying image index.
    #[inline]
    #[must_use]
    pub fn image_index(&self) -> &'a ImageIndex {
        self.index
    }

    /// Width of each type's label block; shared so blocks stay disjoint.
    fn label_space(&self) -> u32 {
        self.pools.iter().map(|pool| pool.bound).max().unwrap_or(1)
    }

    /// Number of reference type blocks (highest declared tag plus one).
    fn type_span(&self) -> u32 {
        self.index
            .reference_sets()
            .iter()
            .map(|set| u32::from(set.type_tag().value()) + 1)
            .max()
            .unwrap_or(0)
    }

    fn project(&mut self) {
        let label_space = self.label_space();
        let mut projected: Vec<u32> = self
            .index
            .data()
            .iter()
            .enumerate()
            .map(|(offset, &byte)| {
                if self.index.is_token(offset as Offset) {
                    u32::from(byte)
                } else {
                    NON_TOKEN_UNIT
                }
            })
            .collect();
        for set in self.index.reference_sets() {
            let block = BASE_REFERENCE_UNIT + u32::from(set.type_tag().value()) * label_space;
            let pool = &self.pools[usize::from(set.pool_tag().value())];
            for reference in set.references() {
                let key = set.at(reference.location).target_key;
                let label = pool.labels.get(key as usize).copied().unwrap_or(0);
                projected[reference.location as usize] = block + label;
            }
        }
        self.projected = projected;
    }
}

//! crates/index/src/image.rs
//!
//! Image index construction and per-position queries.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::reference::{Reference, ReferenceSet, ReferenceTypeSpec};
use crate::tags::{Offset, PoolTag, TypeTag};

/// Errors raised while overlaying typed references on a byte buffer.
#[derive(Debug, Error)]
pub enum ImageIndexError {
    /// The buffer exceeds the addressable offset range.
    #[error("image of {bytes} bytes exceeds the {max}-byte offset range", max = Offset::MAX)]
    ImageTooLarge {
        /// Size of the rejected buffer.
        bytes: usize,
    },
    /// Two reference groups declared the same type tag.
    #[error("reference type {0:?} declared more than once")]
    DuplicateType(TypeTag),
    /// A reference with zero encoded width was declared.
    #[error("reference type {0:?} declares zero width")]
    ZeroWidth(TypeTag),
    /// A reference encoding extends past the end of the image.
    #[error("reference at {location} with width {width} reads past image end {size}")]
    ReferenceOutOfBounds {
        /// Offset of the first encoded byte.
        location: Offset,
        /// Declared encoding width.
        width: u8,
        /// Image size.
        size: Offset,
    },
    /// Two reference encodings cover the same byte.
    #[error("reference at {location} overlaps a previously declared reference")]
    OverlappingReference {
        /// Offset of the first encoded byte of the later reference.
        location: Offset,
    },
}

/// A byte image overlaid with typed, pooled cross-references.
///
/// Positions not covered by any reference are raw data. The first byte of a
/// reference encoding is a token; its trailing bytes are not, and are
/// attributed to that token by all downstream consumers.
#[derive(Clone, Debug)]
pub struct ImageIndex {
    data: Vec<u8>,
    type_at: Vec<Option<TypeTag>>,
    token: Vec<bool>,
    reference_sets: Vec<ReferenceSet>,
    pool_targets: Vec<Vec<Offset>>,
}

impl ImageIndex {
    /// Builds an index from a buffer and the references of each encoding
    /// type.
    ///
    /// # Errors
    ///
    /// Rejects buffers larger than the offset range, duplicate type tags,
    /// zero-width encodings, references reading past the image end, and
    /// references whose encodings overlap.
    pub fn new(
        data: Vec<u8>,
        references: Vec<(ReferenceTypeSpec, Vec<Reference>)>,
    ) -> Result<Self, ImageIndexError> {
        let size = Offset::try_from(data.len())
            .map_err(|_| ImageIndexError::ImageTooLarge { bytes: data.len() })?;

        let mut type_at = vec![None; data.len()];
        let mut token = vec![true; data.len()];
        for (spec, refs) in &references {
            if spec.width == 0 {
                return Err(ImageIndexError::ZeroWidth(spec.type_tag));
            }
            if references
                .iter()
                .filter(|(other, _)| other.type_tag == spec.type_tag)
                .count()
                > 1
            {
                return Err(ImageIndexError::DuplicateType(spec.type_tag));
            }
            for reference in refs {
                let end = u64::from(reference.location) + u64::from(spec.width);
                if end > u64::from(size) {
                    return Err(ImageIndexError::ReferenceOutOfBounds {
                        location: reference.location,
                        width: spec.width,
                        size,
                    });
                }
                let span = reference.location as usize..end as usize;
                if type_at[span.clone()].iter().any(Option::is_some) {
                    return Err(ImageIndexError::OverlappingReference {
                        location: reference.location,
                    });
                }
                for covered in span {
                    type_at[covered] = Some(spec.type_tag);
                    token[covered] = covered == reference.location as usize;
                }
            }
        }

        let pool_count = references
            .iter()
            .map(|(spec, _)| usize::from(spec.pool_tag.value()) + 1)
            .max()
            .unwrap_or(0);
        let mut pool_targets: Vec<Vec<Offset>> = vec![Vec::new(); pool_count];
        for (spec, refs) in &references {
            let pool = &mut pool_targets[usize::from(spec.pool_tag.value())];
            pool.extend(refs.iter().map(|reference| reference.target));
        }
        for targets in &mut pool_targets {
            targets.sort_unstable();
            targets.dedup();
        }

        let reference_sets = references
            .into_iter()
            .map(|(spec, mut refs)| {
                refs.sort_unstable_by_key(|reference| reference.location);
                let targets = &pool_targets[usize::from(spec.pool_tag.value())];
                let target_keys: FxHashMap<Offset, u32> = refs
                    .iter()
                    .map(|reference| {
                        let key = targets
                            .binary_search(&reference.target)
                            .unwrap_or_else(|_| unreachable!("target collected above"));
                        (reference.location, key as u32)
                    })
                    .collect();
                ReferenceSet::new(spec, refs, target_keys)
            })
            .collect();

        Ok(Self {
            data,
            type_at,
            token,
            reference_sets,
            pool_targets,
        })
    }

    /// Returns the image size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Offset {
        self.data.len() as Offset
    }

    /// Returns the underlying bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw byte at `offset`.
    #[inline]
    #[must_use]
    pub fn byte_at(&self, offset: Offset) -> u8 {
        self.data[offset as usize]
    }

    /// Reports whether `offset` starts a token (a raw byte or the first
    /// byte of a reference encoding).
    #[inline]
    #[must_use]
    pub fn is_token(&self, offset: Offset) -> bool {
        self.token[offset as usize]
    }

    /// Returns the content tag at `offset`, or `None` for raw data.
    #[inline]
    #[must_use]
    pub fn type_at(&self, offset: Offset) -> Option<TypeTag> {
        self.type_at[offset as usize]
    }

    /// Reports whether `offset` lies within a reference encoding.
    #[inline]
    #[must_use]
    pub fn is_reference(&self, offset: Offset) -> bool {
        self.type_at[offset as usize].is_some()
    }

    /// Returns the reference set of one encoding type.
    ///
    /// # Panics
    ///
    /// Panics if no reference group declared `type_tag`.
    #[must_use]
    pub fn refs(&self, type_tag: TypeTag) -> &ReferenceSet {
        self.reference_sets
            .iter()
            .find(|set| set.type_tag() == type_tag)
            .unwrap_or_else(|| panic!("no reference set declares {type_tag:?}"))
    }

    /// Returns all reference sets.
    #[inline]
    #[must_use]
    pub fn reference_sets(&self) -> &[ReferenceSet] {
        &self.reference_sets
    }

    /// Returns the number of declared pools.
    #[inline]
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pool_targets.len()
    }

    /// Returns the sorted distinct target offsets of a pool.
    ///
    /// Target keys index this slice.
    #[must_use]
    pub fn pool_targets(&self, pool_tag: PoolTag) -> &[Offset] {
        &self.pool_targets[usize::from(pool_tag.value())]
    }
}

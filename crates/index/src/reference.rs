//! crates/index/src/reference.rs
//!
//! Reference declarations and per-type reference sets.

use rustc_hash::FxHashMap;

use crate::tags::{Offset, PoolTag, TypeTag};

/// A typed cross-reference embedded in an image.
///
/// `location` is the offset of the first encoded byte; `target` is the
/// offset the reference points at within its pool's address space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reference {
    /// Offset of the first byte of the encoded reference.
    pub location: Offset,
    /// Offset the reference resolves to.
    pub target: Offset,
}

impl Reference {
    /// Creates a reference declaration.
    #[must_use]
    pub const fn new(location: Offset, target: Offset) -> Self {
        Self { location, target }
    }
}

/// Describes one reference encoding type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReferenceTypeSpec {
    /// Number of bytes one encoded reference occupies.
    pub width: u8,
    /// Content tag distinguishing this encoding from raw data and from
    /// other reference types.
    pub type_tag: TypeTag,
    /// Pool whose address space the targets resolve into.
    pub pool_tag: PoolTag,
}

impl ReferenceTypeSpec {
    /// Creates a type spec.
    #[must_use]
    pub const fn new(width: u8, type_tag: TypeTag, pool_tag: PoolTag) -> Self {
        Self {
            width,
            type_tag,
            pool_tag,
        }
    }
}

/// A reference resolved to its dense per-pool target key.
///
/// Keys index the pool's sorted target list, so affinity oracles can store
/// per-target state in plain vectors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndirectReference {
    /// Dense key of the reference's target within its pool.
    pub target_key: u32,
}

/// All references of one encoding type, resolved against their pool.
#[derive(Clone, Debug)]
pub struct ReferenceSet {
    spec: ReferenceTypeSpec,
    references: Vec<Reference>,
    target_keys: FxHashMap<Offset, u32>,
}

impl ReferenceSet {
    /// Creates a set from references sorted by location and their resolved
    /// target keys.
    pub(crate) fn new(
        spec: ReferenceTypeSpec,
        references: Vec<Reference>,
        target_keys: FxHashMap<Offset, u32>,
    ) -> Self {
        debug_assert!(references.windows(2).all(|w| w[0].location < w[1].location));
        Self {
            spec,
            references,
            target_keys,
        }
    }

    /// Returns the byte width of one encoded reference.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.spec.width
    }

    /// Returns the content tag of this encoding type.
    #[inline]
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        self.spec.type_tag
    }

    /// Returns the pool the targets resolve into.
    #[inline]
    #[must_use]
    pub const fn pool_tag(&self) -> PoolTag {
        self.spec.pool_tag
    }

    /// Returns the references of this set, sorted by location.
    #[inline]
    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Resolves the reference whose encoding starts at `location`.
    ///
    /// # Panics
    ///
    /// Panics if no reference of this set starts at `location`; callers must
    /// only pass locations reported as reference tokens.
    #[must_use]
    pub fn at(&self, location: Offset) -> IndirectReference {
        IndirectReference {
            target_key: self.target_keys[&location],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> ReferenceSet {
        let spec = ReferenceTypeSpec::new(4, TypeTag::new(0), PoolTag::new(0));
        let references = vec![Reference::new(0, 8), Reference::new(4, 12)];
        let mut target_keys = FxHashMap::default();
        target_keys.insert(0, 0);
        target_keys.insert(4, 1);
        ReferenceSet::new(spec, references, target_keys)
    }

    #[test]
    fn accessors_expose_spec() {
        let set = sample_set();
        assert_eq!(set.width(), 4);
        assert_eq!(set.type_tag(), TypeTag::new(0));
        assert_eq!(set.pool_tag(), PoolTag::new(0));
        assert_eq!(set.references().len(), 2);
    }

    #[test]
    fn at_resolves_target_keys() {
        let set = sample_set();
        assert_eq!(set.at(0), IndirectReference { target_key: 0 });
        assert_eq!(set.at(4), IndirectReference { target_key: 1 });
    }

    #[test]
    #[should_panic]
    fn at_panics_on_unknown_location() {
        let set = sample_set();
        let _ = set.at(2);
    }
}

//! crates/index/src/tags.rs
//!
//! Offset and tag newtypes shared across the delta pipeline.

/// Index of a byte within an image.
///
/// Ranges are half-open `[offset, offset + length)`. Images are limited to
/// `u32::MAX` bytes so offsets stay compact in candidate lists and suffix
/// arrays.
pub type Offset = u32;

/// Identifies the kind of content occupying a position in an image.
///
/// Every reference encoding type carries a distinct tag; raw data carries
/// none. Two positions with different tags can never be part of the same
/// equivalence.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeTag(u8);

impl TypeTag {
    /// Creates a tag from its raw value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Identifies the target address space shared by a group of references.
///
/// Target affinities are computed per pool; multiple reference types may
/// resolve into the same pool.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PoolTag(u8);

impl PoolTag {
    /// Creates a tag from its raw value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_round_trip() {
        assert_eq!(TypeTag::new(3).value(), 3);
    }

    #[test]
    fn pool_tag_round_trip() {
        assert_eq!(PoolTag::new(7).value(), 7);
    }

    #[test]
    fn tags_with_equal_values_are_equal() {
        assert_eq!(TypeTag::new(1), TypeTag::new(1));
        assert_ne!(TypeTag::new(1), TypeTag::new(2));
        assert_eq!(PoolTag::new(0), PoolTag::new(0));
    }

    #[test]
    fn tags_order_by_value() {
        assert!(TypeTag::new(1) < TypeTag::new(2));
        assert!(PoolTag::new(0) < PoolTag::new(5));
    }
}

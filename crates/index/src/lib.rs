#![deny(unsafe_code)]

//! Typed image indexing for binary delta matching.
//!
//! This crate provides the image model the delta pipeline reasons about:
//! - [`ImageIndex`] overlays typed cross-references on a raw byte buffer
//! - [`ReferenceSet`] groups the references of one encoding type
//! - [`EncodedView`] projects an image into the unit stream that suffix
//!   sorting and seed search operate on
//!
//! # Design
//!
//! A binary image is mostly opaque bytes, but some ranges are relocatable
//! references whose raw encodings change between builds even when they point
//! at the same logical entity. The index records where those references live
//! and which target address space (pool) they resolve into, so that matching
//! can compare targets instead of encoded bytes. The encoded view replaces
//! each reference token with a per-pool label so lexicographic comparison
//! generalizes across differently-encoded but equivalent references.
//!
//! # See also
//!
//! - `equivalence` crate for the matcher that consumes these views
//! - `suffix` crate for the suffix array built over an encoded view

mod encoded;
mod image;
mod reference;
mod tags;

pub use encoded::EncodedView;
pub use image::{ImageIndex, ImageIndexError};
pub use reference::{IndirectReference, Reference, ReferenceSet, ReferenceTypeSpec};
pub use tags::{Offset, PoolTag, TypeTag};

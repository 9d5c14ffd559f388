//! Header-field registration types.
//!
//! Dissectors declare their fields up front as static [`HeaderField`]
//! descriptors. The registry indexes them by abbreviation, and every item
//! a dissector adds to a [`FieldTree`](crate::tree::FieldTree) points back
//! at one of them.

mod field;
mod kind;

pub use field::HeaderField;
pub use kind::FieldKind;

//! Signed profile attributes.
//!
//! A signed attribute holds a scalar (`value`) or a member mapping
//! (`values`) together with timestamps, a display level and a signature.

pub mod metadata;
pub mod signable;
pub mod value;

pub use metadata::{DisplayLevel, Metadata};
pub use signable::{ChangeDescription, SignableAttribute, WriteContext};
pub use value::{AttributeValue, Scalar, ValueSet};

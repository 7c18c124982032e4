//! Profile trees and the projections between them.

pub mod flat;
pub mod projector;
pub mod raw;

pub use flat::{FlatMap, FlatValue};
pub use projector::{bootstrap, flatten, synchronize};
pub use raw::{RawNode, RawTree};

//! Profile storage backends.
//!
//! Both backends implement [`ProfileSource`](crate::provider::ProfileSource)
//! and [`ProfileSink`](crate::provider::ProfileSink), so a profile can be
//! loaded from and published back to either one.
//!
//! # Directory layout
//!
//! ```text
//! {root}/
//! ├── skeleton.json
//! └── profiles/
//!     └── {user_id}.json
//! ```
//!
//! Files hold plain provider documents with no wrapper, so they can be
//! exchanged with the identity provider verbatim.

pub mod directory_store;
pub mod memory_store;

pub use directory_store::DirectoryStore;
pub use memory_store::MemoryStore;

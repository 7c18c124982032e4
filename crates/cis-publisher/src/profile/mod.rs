//! The profile aggregate and its change bookkeeping.

pub mod deletable;
pub mod notification;
#[allow(clippy::module_inception)]
pub mod profile;

pub use deletable::{is_deletable, DELETABLE_PROFILE_FIELDS};
pub use notification::Notification;
pub use profile::{Profile, PublishOutcome};

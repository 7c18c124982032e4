//! Change notifications.

use crate::attribute::ChangeDescription;

/// One attribute that changed during signing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Notification {
    /// Dotted attribute path, e.g. `access_information.ldap`.
    pub attribute: String,
    pub description: ChangeDescription,
}

impl Notification {
    pub fn new(attribute: impl Into<String>, description: ChangeDescription) -> Self {
        Self {
            attribute: attribute.into(),
            description,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.attribute, self.description)
    }
}

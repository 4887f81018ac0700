//! Value objects for the repair order domain.

use serde::{Deserialize, Serialize};

/// Counter of customer approvals on an order.
///
/// Starts at 0 and goes up by exactly one on every authorization or
/// reauthorization. Collaborators can use it as a guard token when they
/// need to detect that the approved amount moved under them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AuthorizationVersion(u32);

impl AuthorizationVersion {
    /// Creates a version from a raw value.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the version of an order nobody has authorized yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version set by the first authorization.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AuthorizationVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AuthorizationVersion> for u32 {
    fn from(version: AuthorizationVersion) -> Self {
        version.0
    }
}

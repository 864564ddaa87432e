//! Well-known role identifiers and the role-set value type.
//!
//! Roles are small integers assigned by the identity store: `0` is the
//! administrator role, `1` the regular-user role. Broadcast filtering works
//! on role-set intersection, so the set of roles that observe lock and
//! membership traffic is configuration, not a constant (see
//! `ServerConfig::observer_roles`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A role identifier as stored on the identity.
pub type RoleId = i32;

pub const ROLE_ADMIN: RoleId = 0;
pub const ROLE_USER: RoleId = 1;

/// An unordered set of role ids carried by an identity or used as a
/// broadcast filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleId>);

impl RoleSet {
    /// The empty role set. Matches no filter.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, role: RoleId) -> bool {
        self.0.contains(&role)
    }

    /// `true` if the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.iter().any(|r| other.0.contains(r))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RoleId> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

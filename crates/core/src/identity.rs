//! The resolved authenticated principal.

use serde::{Deserialize, Serialize};

use crate::roles::RoleSet;
use crate::types::DbId;

/// A resolved, authenticated principal.
///
/// An identity may stand behind any number of concurrent connections
/// (multiple tabs or devices). Locks are keyed by the stable `id`;
/// `username` is unique in the identity store but is carried here for
/// presentation only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: DbId,
    pub username: String,
    /// Role snapshot taken when the identity was resolved. Connections keep
    /// the snapshot from admission time; a role change in the identity
    /// store does not propagate to live connections.
    pub roles: RoleSet,
}

impl Identity {
    pub fn new(id: DbId, username: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            id,
            username: username.into(),
            roles,
        }
    }
}

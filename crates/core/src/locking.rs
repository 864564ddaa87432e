//! Advisory-lock domain types and validation.
//!
//! This module lives in `core` (zero internal deps) so that the HTTP
//! handlers, the in-memory lock table, and the WebSocket layer all agree on
//! what a lock key is and how it is encoded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Separator between the resource kind and the resource id in the encoded
/// key. The kind must not contain it, so `kind:id` stays collision-free.
pub const KEY_SEPARATOR: char = ':';

/// Composite key naming one lockable resource, e.g. `person:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    kind: String,
    id: String,
}

impl LockKey {
    /// Build a key from a resource kind (table/category tag) and an
    /// identifier. Both parts must be non-empty, and the kind must not
    /// contain `:` so the string encoding stays unambiguous.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Result<Self, CoreError> {
        let kind = kind.into();
        let id = id.into();

        if kind.is_empty() {
            return Err(CoreError::Validation("Lock kind must not be empty".into()));
        }
        if kind.contains(KEY_SEPARATOR) {
            return Err(CoreError::Validation(format!(
                "Lock kind must not contain '{KEY_SEPARATOR}', got '{kind}'"
            )));
        }
        if id.is_empty() {
            return Err(CoreError::Validation("Lock id must not be empty".into()));
        }

        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stable `kind:id` string encoding.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.kind, KEY_SEPARATOR, self.id)
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind, KEY_SEPARATOR, self.id)
    }
}

/// Advisory exclusive ownership of one resource.
///
/// Keyed by the holder's stable identity id; `holder_username` is what gets
/// shown to other users in conflict messages and broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    pub holder_id: DbId,
    pub holder_username: String,
    pub acquired_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

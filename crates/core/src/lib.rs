//! Roster domain types (zero internal deps).
//!
//! Everything the API layer, WebSocket handlers, and the notification bus
//! need to agree on lives here: identifiers, the error taxonomy, roles,
//! resolved identities, lock domain types, and the wire protocol.

pub mod error;
pub mod identity;
pub mod locking;
pub mod roles;
pub mod types;
pub mod wire;

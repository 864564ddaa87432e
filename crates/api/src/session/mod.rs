//! Session bridging: signed cookies, the session-store seam, and the
//! bridge that resolves transport credentials to identities.

pub mod bridge;
pub mod cookie;
pub mod store;

pub use bridge::{ActiveSession, SessionBridge};
pub use store::{MemorySessionStore, SessionRecord, SessionStore};

//! HTTP handlers, grouped by resource.

pub mod active_sessions;
pub mod locks;

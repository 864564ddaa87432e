//! Roster notification fan-out abstraction.
//!
//! Defines the [`NotificationBus`] seam between the business side (lock
//! table, session bridge) and whatever transport actually reaches clients.
//! The production implementation is the WebSocket connection registry in
//! `roster-api`; tests substitute recording or no-op buses.

pub mod bus;

pub use bus::{NotificationBus, NullBus};

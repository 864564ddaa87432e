//! The process-wide advisory lock registry.

mod table;

pub use table::{AcquireOutcome, LockTable};

//! Domain types and pure logic for upback.
//!
//! Zero internal dependencies so the persistence, engine and HTTP crates
//! can all share one error type and one notion of paths and schedules.

pub mod cron;
pub mod error;
pub mod paths;
pub mod sync_events;
pub mod types;

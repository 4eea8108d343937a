//! Stream adapters for paced consumers.
//!
//! Telemetry arrives at radio rate; a display repaints at its own rate.
//! [`CoalesceExt::coalesce`] bridges the two, emitting at most one item per
//! period and discarding everything but the newest.

mod coalesce;

pub use coalesce::{Coalesced, CoalesceExt};

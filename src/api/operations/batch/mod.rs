//! Batched writes grouped by (path, verb)

pub mod plan;
pub mod planner;

pub use plan::{BatchGroup, BatchKey, group_by_key};
pub use planner::{BatchOutput, BatchPlanner, ResponseMode, WriteOptions};

//! Write operations against the amoCRM API

pub mod batch;
pub mod operation;

pub use batch::{BatchOutput, BatchPlanner, ResponseMode, WriteOptions};
pub use operation::WriteKind;

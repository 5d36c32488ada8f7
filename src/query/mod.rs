//! Statement execution.

mod executor;

pub use executor::{execute, ExecutionOutcome};

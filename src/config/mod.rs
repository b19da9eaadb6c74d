//! Configuration models for the global executor.

pub mod executor;

pub use crate::backend::BackendKind;
pub use executor::ExecutorConfig;

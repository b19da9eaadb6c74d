//! Unit tests for individual components

mod config_test;
mod error_test;
mod job_test;
mod time_test;
mod trace_test;

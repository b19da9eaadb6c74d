//! Process-wide entry points and the compatibility seam in front of them.

pub mod api;
pub mod compat;

pub use api::{
    drain_main_queue, enqueue_global, enqueue_global_with_deadline, enqueue_global_with_delay,
    enqueue_main, global, install_from_config, install_global_executor, installed, is_main_executor,
    main_executor, set_main_executor_override,
};
pub use compat::{register_overrides, CompatibilityOverrides};

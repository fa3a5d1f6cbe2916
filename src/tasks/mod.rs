//! Background Tasks Module
//!
//! Long-running maintenance tasks for the cache.

mod sweeper;

pub use sweeper::spawn_sweep_task;

//! Shared task model and wire definitions for Taskman.

pub mod api;
pub mod codec;
pub mod pending;
pub mod task;

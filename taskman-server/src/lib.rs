//! Taskman REST API server library.
//!
//! Exposes the router, store and configuration so tests and other binaries
//! can run the API in-process.

pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod validate;

//! `taskman`: offline-first task manager client library.
//!
//! The [`sync::SyncCoordinator`] wraps a [`remote::RemoteApi`] with a
//! [`cache::LocalCache`] and a [`queue::PendingQueue`], both persisted through
//! a [`storage::Storage`] medium.

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod queue;
pub mod remote;
pub mod storage;
pub mod sync;

//! Durable queue consumption and upload execution for ZenBridge.
//!
//! This crate provides:
//! - A task queue wrapper over the durable queue repository
//! - A worker runner that claims and processes one message at a time
//! - The upload job handler implementing the upload protocol

pub mod jobs;
pub mod queue;
pub mod runner;

pub use queue::TaskQueue;
pub use runner::WorkerRunner;

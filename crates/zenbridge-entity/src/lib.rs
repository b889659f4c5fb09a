//! # zenbridge-entity
//!
//! Domain entity models for ZenBridge: transfer records, the queued
//! message row, and the upload task wire payload.

pub mod queue;
pub mod transfer;

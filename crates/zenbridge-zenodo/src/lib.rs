//! # zenbridge-zenodo
//!
//! HTTP client for the Zenodo deposition API: deposition metadata,
//! deposition creation, and streaming file uploads to deposition buckets.

pub mod client;
pub mod models;

pub use client::ZenodoClient;
pub use models::{Creator, Deposition, NewDepositionMetadata};

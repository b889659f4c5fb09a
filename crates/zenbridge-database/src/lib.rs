//! # zenbridge-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the transfer record store and the durable queue.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;

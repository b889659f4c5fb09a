//! Durable queue message entity.

pub mod model;

pub use model::{MessageState, QueuedMessage};

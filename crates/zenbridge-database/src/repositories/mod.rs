//! Repository implementations for the ZenBridge entities.

pub mod queue;
pub mod transfer;

pub use queue::QueueRepository;
pub use transfer::TransferRepository;

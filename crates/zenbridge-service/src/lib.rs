//! # zenbridge-service
//!
//! Business logic service layer for ZenBridge. Services orchestrate the
//! repositories and the Zenodo client to implement application-level use
//! cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod submit;
pub mod transfers;

pub use submit::{CreateDepositionRequest, SubmitRequest, SubmitService};
pub use transfers::TransferQueryService;

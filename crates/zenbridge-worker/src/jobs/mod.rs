//! Job handler implementations.

pub mod upload;

pub use upload::UploadJobHandler;

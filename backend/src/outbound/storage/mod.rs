//! Object store adapters implementing the `ObjectStore` port.
//!
//! - **s3**: any S3-compatible bucket through `aws-sdk-s3`
//! - **memory**: process-local store for development and tests

mod memory;
mod s3;

pub use memory::InMemoryObjectStore;
pub use s3::{S3ObjectStore, S3Settings};

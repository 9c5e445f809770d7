//! Diary backend library: domain, adapters and HTTP wiring.
//!
//! The binary in `main.rs` composes these modules into a running server;
//! integration tests drive the same services through the in-memory adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;

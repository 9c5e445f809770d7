//! OpenAPI schema definitions for envelope and shared-crate types.
//!
//! The `pagination` crate stays free of utoipa, and the failure envelope is
//! assembled at the HTTP edge, so their schemas are registered here.

use utoipa::ToSchema;

use crate::domain::Error;

/// OpenAPI schema for the failure envelope wrapping [`Error`].
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Always `false` for failures.
    #[schema(example = false)]
    success: bool,
    /// Machine-readable code, message and optional details.
    error: Error,
}

/// OpenAPI schema for [`pagination::PageInfo`].
#[derive(ToSchema)]
#[schema(as = PageInfo)]
#[serde(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PageInfoSchema {
    /// One-based page number that was served.
    #[schema(example = 1)]
    page: u32,
    /// Requested page size.
    #[schema(example = 10)]
    limit: u32,
    /// Total number of diaries across all pages.
    #[schema(example = 42)]
    total: u64,
    /// `ceil(total / limit)`.
    #[schema(example = 5)]
    total_pages: u64,
}

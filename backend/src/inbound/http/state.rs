//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, DiaryCommand, DiaryQuery, TokenAuthenticator, UploadSessionCommand,
    UploadSessionQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub tokens: Arc<dyn TokenAuthenticator>,
    pub uploads: Arc<dyn UploadSessionCommand>,
    pub uploads_query: Arc<dyn UploadSessionQuery>,
    pub diaries: Arc<dyn DiaryCommand>,
    pub diaries_query: Arc<dyn DiaryQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub tokens: Arc<dyn TokenAuthenticator>,
    pub uploads: Arc<dyn UploadSessionCommand>,
    pub uploads_query: Arc<dyn UploadSessionQuery>,
    pub diaries: Arc<dyn DiaryCommand>,
    pub diaries_query: Arc<dyn DiaryQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            tokens,
            uploads,
            uploads_query,
            diaries,
            diaries_query,
        } = ports;
        Self {
            accounts,
            tokens,
            uploads,
            uploads_query,
            diaries,
            diaries_query,
        }
    }
}

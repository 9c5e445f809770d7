//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use diary_backend::domain::ports::{ObjectStore, TokenService};
use diary_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) tokens: Arc<dyn TokenService>,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration around the object store and token issuer.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        store: Arc<dyn ObjectStore>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            bind_addr,
            store,
            tokens,
            db_pool: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// Without one the server keeps users, sessions and diaries in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

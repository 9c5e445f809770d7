//! Builders wiring repositories and adapters into HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use diary_backend::domain::ports::{
    AccountCommand, DiaryCommand, DiaryQuery, DiaryRepository, ObjectStore, TokenAuthenticator,
    TokenService, UploadSessionCommand, UploadSessionQuery, UploadSessionRepository,
    UserRepository,
};
use diary_backend::domain::{AccountService, DiaryService, UploadSessionService};
use diary_backend::inbound::http::state::{HttpState, HttpStatePorts};
use diary_backend::outbound::memory::InMemoryDatabase;
use diary_backend::outbound::persistence::{
    DieselDiaryRepository, DieselUploadSessionRepository, DieselUserRepository,
};
use diary_backend::outbound::security::Argon2PasswordHasher;

use super::ServerConfig;

/// The three repositories every backend needs.
struct Repositories<U, S, D> {
    users: Arc<U>,
    sessions: Arc<S>,
    diaries: Arc<D>,
}

/// Adapters shared by all services regardless of the repository backend.
struct SharedAdapters {
    store: Arc<dyn ObjectStore>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

fn wire_ports<U, S, D>(repos: Repositories<U, S, D>, shared: SharedAdapters) -> HttpStatePorts
where
    U: UserRepository + 'static,
    S: UploadSessionRepository + 'static,
    D: DiaryRepository + 'static,
{
    let Repositories {
        users,
        sessions,
        diaries,
    } = repos;
    let SharedAdapters {
        store,
        tokens,
        clock,
    } = shared;

    let accounts = Arc::new(AccountService::new(
        users,
        Arc::new(Argon2PasswordHasher::new()),
        tokens,
        clock.clone(),
    ));
    let uploads = Arc::new(UploadSessionService::new(
        sessions.clone(),
        store.clone(),
        clock.clone(),
    ));
    let diary_service = Arc::new(DiaryService::new(diaries, sessions, store, clock));

    HttpStatePorts {
        accounts: accounts.clone() as Arc<dyn AccountCommand>,
        tokens: accounts as Arc<dyn TokenAuthenticator>,
        uploads: uploads.clone() as Arc<dyn UploadSessionCommand>,
        uploads_query: uploads as Arc<dyn UploadSessionQuery>,
        diaries: diary_service.clone() as Arc<dyn DiaryCommand>,
        diaries_query: diary_service as Arc<dyn DiaryQuery>,
    }
}

/// Build HTTP state from the server configuration.
///
/// Diesel repositories back the services when a pool is configured; the
/// in-memory database is used otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let shared = SharedAdapters {
        store: config.store.clone(),
        tokens: config.tokens.clone(),
        clock: Arc::new(DefaultClock),
    };

    let ports = match &config.db_pool {
        Some(pool) => wire_ports(
            Repositories {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                sessions: Arc::new(DieselUploadSessionRepository::new(pool.clone())),
                diaries: Arc::new(DieselDiaryRepository::new(
                    pool.clone(),
                    config.store.clone(),
                )),
            },
            shared,
        ),
        None => {
            let db = InMemoryDatabase::new();
            wire_ports(
                Repositories {
                    users: Arc::new(db.users()),
                    sessions: Arc::new(db.upload_sessions()),
                    diaries: Arc::new(db.diaries(config.store.clone())),
                },
                shared,
            )
        }
    };

    web::Data::new(HttpState::new(ports))
}

//! Shared harness wiring the real services over in-memory adapters.

#![allow(dead_code, reason = "each test binary uses a different subset")]

pub mod embedded_postgres;

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, TimeZone, TimeDelta, Utc};
use diary_backend::domain::ports::{
    AccountCommand, ConfirmUploadRequest, CreateUploadSessionRequest, DiaryCommand, DiaryQuery,
    TokenAuthenticator, UploadSessionCommand, UploadSessionQuery,
};
use diary_backend::domain::{
    AccountService, AuthSession, DiaryService, SignupDetails, UploadSessionId,
    UploadSessionService, UserId,
};
use diary_backend::inbound::http::state::{HttpState, HttpStatePorts};
use diary_backend::outbound::memory::InMemoryDatabase;
use diary_backend::outbound::security::{Argon2PasswordHasher, JwtTokenService};
use diary_backend::outbound::storage::InMemoryObjectStore;
use diary_backend::test_support::MutableClock;

pub const PASSWORD: &str = "correct horse battery";
const SECRET: &[u8] = b"integration-secret-0123456789abcdef";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Services and adapters for one isolated backend instance.
pub struct Backend {
    pub clock: MutableClock,
    pub store: InMemoryObjectStore,
    pub ports: HttpStatePorts,
}

impl Backend {
    pub fn new() -> Self {
        let clock = MutableClock::new(start());
        let store = InMemoryObjectStore::new();
        let db = InMemoryDatabase::new();
        let object_store = Arc::new(store.clone());
        let sessions = Arc::new(db.upload_sessions());

        let accounts = Arc::new(AccountService::new(
            Arc::new(db.users()),
            Arc::new(Argon2PasswordHasher::new()),
            Arc::new(JwtTokenService::new(SECRET, TimeDelta::days(7))),
            Arc::new(clock.clone()),
        ));
        let uploads = Arc::new(UploadSessionService::new(
            sessions.clone(),
            object_store.clone(),
            Arc::new(clock.clone()),
        ));
        let diaries = Arc::new(DiaryService::new(
            Arc::new(db.diaries(object_store.clone())),
            sessions,
            object_store,
            Arc::new(clock.clone()),
        ));

        let ports = HttpStatePorts {
            accounts: accounts.clone() as Arc<dyn AccountCommand>,
            tokens: accounts as Arc<dyn TokenAuthenticator>,
            uploads: uploads.clone() as Arc<dyn UploadSessionCommand>,
            uploads_query: uploads as Arc<dyn UploadSessionQuery>,
            diaries: diaries.clone() as Arc<dyn DiaryCommand>,
            diaries_query: diaries as Arc<dyn DiaryQuery>,
        };
        Self {
            clock,
            store,
            ports,
        }
    }

    pub fn http_state(&self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(self.ports.clone()))
    }

    pub async fn signup(&self, email: &str) -> AuthSession {
        let details =
            SignupDetails::try_from_parts(email, PASSWORD, "Diarist").expect("valid signup");
        self.ports.accounts.signup(details).await.expect("signup succeeds")
    }

    /// Open a session for `count` JPEGs, land every file and confirm it.
    pub async fn stage_photos(&self, user_id: &UserId, count: u8) -> UploadSessionId {
        let created = self
            .ports
            .uploads
            .create_session(CreateUploadSessionRequest {
                user_id: user_id.clone(),
                file_count: count,
                file_names: (0..count).map(|i| format!("photo-{i}.jpg")).collect(),
            })
            .await
            .expect("session opens");

        for presigned in &created.targets {
            let target = &presigned.target;
            self.store
                .insert(&target.staging_key, "image/jpeg", vec![target.index; 16])
                .await;
            self.ports
                .uploads
                .confirm_upload(ConfirmUploadRequest {
                    user_id: user_id.clone(),
                    upload_id: created.session.id(),
                    file_id: target.file_id.clone(),
                    staging_key: target.staging_key.clone(),
                    size_bytes: 16,
                    mime_type: "image/jpeg".to_owned(),
                })
                .await
                .expect("upload confirms");
        }
        created.session.id()
    }
}

//! Test helpers for inbound HTTP components.
//!
//! [`StateBuilder`] starts from expectation-free mocks for every port, so any
//! unexpected call fails the test loudly.

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::domain::ports::{
    MockAccountCommand, MockDiaryCommand, MockDiaryQuery, MockTokenAuthenticator,
    MockUploadSessionCommand, MockUploadSessionQuery,
};
use crate::domain::{AuthenticatedUser, DisplayName, Email, User, UserId};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

pub(crate) const TEST_TOKEN: &str = "test-token";

/// Fixed instant used by handler tests.
pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn sample_user_id() -> UserId {
    UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid fixture user id")
}

pub(crate) fn sample_user() -> User {
    User::new(
        sample_user_id(),
        Email::new("ada@example.com").expect("valid email"),
        DisplayName::new("Ada").expect("valid display name"),
        fixed_now(),
    )
}

pub(crate) fn sample_identity() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: sample_user_id(),
        email: Email::new("ada@example.com").expect("valid email"),
        expires_at: fixed_now() + TimeDelta::days(7),
    }
}

/// Token authenticator accepting [`TEST_TOKEN`] as [`sample_identity`].
pub(crate) fn accepting_tokens() -> MockTokenAuthenticator {
    let mut tokens = MockTokenAuthenticator::new();
    tokens
        .expect_authenticate()
        .withf(|token| token == TEST_TOKEN)
        .returning(|_| Ok(sample_identity()));
    tokens
}

pub(crate) fn bearer() -> (&'static str, String) {
    ("Authorization", format!("Bearer {TEST_TOKEN}"))
}

/// Builder assembling [`HttpState`] from mocks.
#[derive(Default)]
pub(crate) struct StateBuilder {
    accounts: MockAccountCommand,
    tokens: MockTokenAuthenticator,
    uploads: MockUploadSessionCommand,
    uploads_query: MockUploadSessionQuery,
    diaries: MockDiaryCommand,
    diaries_query: MockDiaryQuery,
}

impl StateBuilder {
    pub(crate) fn accounts(mut self, accounts: MockAccountCommand) -> Self {
        self.accounts = accounts;
        self
    }

    pub(crate) fn tokens(mut self, tokens: MockTokenAuthenticator) -> Self {
        self.tokens = tokens;
        self
    }

    pub(crate) fn uploads(mut self, uploads: MockUploadSessionCommand) -> Self {
        self.uploads = uploads;
        self
    }

    pub(crate) fn uploads_query(mut self, uploads_query: MockUploadSessionQuery) -> Self {
        self.uploads_query = uploads_query;
        self
    }

    pub(crate) fn diaries(mut self, diaries: MockDiaryCommand) -> Self {
        self.diaries = diaries;
        self
    }

    pub(crate) fn diaries_query(mut self, diaries_query: MockDiaryQuery) -> Self {
        self.diaries_query = diaries_query;
        self
    }

    pub(crate) fn build(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            tokens: Arc::new(self.tokens),
            uploads: Arc::new(self.uploads),
            uploads_query: Arc::new(self.uploads_query),
            diaries: Arc::new(self.diaries),
            diaries_query: Arc::new(self.diaries_query),
        }))
    }
}

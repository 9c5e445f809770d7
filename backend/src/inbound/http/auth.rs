//! Bearer-token extractor for protected endpoints.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! credential checks and user identity derivation here. A missing or
//! malformed `Authorization` header yields `401`; a token the authenticator
//! rejects yields `403`.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::{AuthenticatedUser, Error, UserId};
use crate::inbound::http::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Identity of the caller, resolved from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext(AuthenticatedUser);

impl AuthContext {
    /// Owning user of the request.
    pub fn user_id(&self) -> &UserId {
        &self.0.user_id
    }

    /// Full identity recovered from the token.
    pub fn identity(&self) -> &AuthenticatedUser {
        &self.0
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; blank tokens are rejected.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::unauthorized("Access token is required"))?;
    let token =
        bearer_token(header).ok_or_else(|| Error::unauthorized("Access token is required"))?;

    let user = state.tokens.authenticate(token).inspect_err(|err| {
        debug!(code = ?err.code(), "bearer token rejected");
    })?;
    Ok(AuthContext(user))
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockTokenAuthenticator;
    use crate::inbound::http::test_utils::{StateBuilder, sample_identity};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, get, test as actix_test};
    use rstest::rstest;

    #[get("/whoami")]
    async fn whoami(auth: AuthContext) -> HttpResponse {
        HttpResponse::Ok().body(auth.user_id().to_string())
    }

    #[rstest]
    #[case("Bearer abc", Some("abc"))]
    #[case("bearer   abc  ", Some("abc"))]
    #[case("Bearer ", None)]
    #[case("Basic abc", None)]
    #[case("abc", None)]
    fn bearer_token_parsing(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(bearer_token(header), expected);
    }

    async fn call(tokens: MockTokenAuthenticator, header: Option<&str>) -> (StatusCode, String) {
        let state = StateBuilder::default().tokens(tokens).build();
        let app = actix_test::init_service(App::new().app_data(state).service(whoami)).await;
        let mut req = actix_test::TestRequest::get().uri("/whoami");
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = actix_test::read_body(res).await;
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_header_is_unauthorised() {
        let (status, _) = call(MockTokenAuthenticator::new(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_header_is_unauthorised() {
        let (status, body) = call(MockTokenAuthenticator::new(), Some("Token abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHORIZED"));
    }

    #[rstest]
    #[actix_web::test]
    async fn rejected_token_is_forbidden() {
        let mut tokens = MockTokenAuthenticator::new();
        tokens
            .expect_authenticate()
            .withf(|token| token == "expired")
            .times(1)
            .return_once(|_| Err(Error::forbidden("Invalid or expired token")));
        let (status, body) = call(tokens, Some("Bearer expired")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("FORBIDDEN"));
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_token_resolves_user() {
        let identity = sample_identity();
        let expected = identity.user_id.to_string();
        let mut tokens = MockTokenAuthenticator::new();
        tokens
            .expect_authenticate()
            .times(1)
            .return_once(move |_| Ok(identity));
        let (status, body) = call(tokens, Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
    }
}

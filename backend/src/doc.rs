//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler in the HTTP inbound layer, the request
//! and response bodies they use, and the bearer-token security scheme.
//!
//! The generated document is served by Swagger UI in debug builds and printed
//! by the `openapi-dump` binary for external tooling.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{AuthSession, Error, ErrorCode, UploadStatus, User};
use crate::inbound::http::accounts::{LoginRequest, SignupRequest};
use crate::inbound::http::diaries::{
    CreateDiaryBody, DeletedBody, DiaryBody, DiaryListBody, DiaryResponseBody, PhotoBody,
    UpdateDiaryBody,
};
use crate::inbound::http::schemas::{ErrorSchema, PageInfoSchema};
use crate::inbound::http::uploads::{
    ConfirmUploadBody, CreateUploadSessionBody, CreatedUploadSessionBody, PresignedUrlBody,
    StagedFileBody, TempPhotoBody, TempPhotoRefBody, UploadSessionBody, UploadSessionResponseBody,
};

/// Enrich the generated document with the bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/v1/auth/signup or /api/v1/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Diary backend API",
        description = "Photo diaries with staged uploads. Successful responses are wrapped in \
                       {\"success\": true, \"data\": ...}; failures in {\"success\": false, \"error\": ...}."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::uploads::create_upload_session,
        crate::inbound::http::uploads::confirm_upload,
        crate::inbound::http::uploads::get_upload_session,
        crate::inbound::http::uploads::upload_file,
        crate::inbound::http::diaries::create_diary,
        crate::inbound::http::diaries::list_diaries,
        crate::inbound::http::diaries::get_diary,
        crate::inbound::http::diaries::update_diary,
        crate::inbound::http::diaries::delete_diary,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ErrorSchema,
        PageInfoSchema,
        User,
        AuthSession,
        UploadStatus,
        SignupRequest,
        LoginRequest,
        CreateUploadSessionBody,
        CreatedUploadSessionBody,
        PresignedUrlBody,
        ConfirmUploadBody,
        StagedFileBody,
        TempPhotoRefBody,
        TempPhotoBody,
        UploadSessionBody,
        UploadSessionResponseBody,
        CreateDiaryBody,
        UpdateDiaryBody,
        PhotoBody,
        DiaryBody,
        DiaryResponseBody,
        DiaryListBody,
        DeletedBody,
    )),
    tags(
        (name = "auth", description = "Account signup and login"),
        (name = "uploads", description = "Upload sessions and staged photos"),
        (name = "diaries", description = "Diary entries and their photos"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

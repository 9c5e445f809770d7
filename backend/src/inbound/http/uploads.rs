//! Upload session HTTP handlers.
//!
//! ```text
//! POST /api/v1/diaries/upload-session {"fileCount","fileNames"}
//! POST /api/v1/diaries/upload-confirm {"uploadId","fileId","filePath","fileSize","mimeType"}
//! GET  /api/v1/diaries/upload-session/{uploadId}
//! PUT  /api/v1/diaries/upload-session/{uploadId}/files/{index}   (raw image body)
//! ```

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    ConfirmUploadRequest, CreateUploadSessionRequest, CreatedUploadSession, DirectUploadRequest,
    PresignedTarget,
};
use crate::domain::{
    Error, MAX_DIRECT_UPLOAD_BYTES, MAX_FILES_PER_SESSION, TempPhoto, UploadSessionId,
    UploadSessionSnapshot, UploadStatus, UploadValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, out_of_range_error, parse_uuid, upload_validation_error,
};

/// Request body for opening an upload session.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadSessionBody {
    #[schema(example = 2, minimum = 1, maximum = 10)]
    pub file_count: i64,
    #[schema(example = json!(["beach.jpg", "sunset.png"]))]
    pub file_names: Vec<String>,
}

/// One presigned staging target.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlBody {
    pub file_id: String,
    pub upload_url: String,
    /// Staging key to echo back as `filePath` when confirming.
    pub file_path: String,
    pub file_name: String,
    /// Content type the presigned PUT must be sent with.
    pub content_type: String,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
}

impl From<PresignedTarget> for PresignedUrlBody {
    fn from(value: PresignedTarget) -> Self {
        let PresignedTarget {
            target,
            upload_url,
            expires_at,
        } = value;
        Self {
            file_id: target.file_id,
            upload_url,
            file_path: target.staging_key,
            file_name: target.file_name,
            content_type: target.content_type.to_owned(),
            expires_at,
        }
    }
}

/// Response payload for a new upload session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUploadSessionBody {
    #[schema(format = "uuid")]
    pub upload_id: String,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
    pub presigned_urls: Vec<PresignedUrlBody>,
}

impl From<CreatedUploadSession> for CreatedUploadSessionBody {
    fn from(value: CreatedUploadSession) -> Self {
        Self {
            upload_id: value.session.id().to_string(),
            expires_at: value.session.expires_at(),
            presigned_urls: value
                .targets
                .into_iter()
                .map(PresignedUrlBody::from)
                .collect(),
        }
    }
}

/// Request body confirming a presigned upload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadBody {
    #[schema(format = "uuid")]
    pub upload_id: String,
    pub file_id: String,
    pub file_path: String,
    #[schema(example = 204_800)]
    pub file_size: i64,
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
}

/// Reference to a staged file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TempPhotoRefBody {
    pub file_id: String,
    #[schema(format = "uuid")]
    pub upload_id: String,
}

/// Response wrapper naming the staged file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagedFileBody {
    pub temp_photo: TempPhotoRefBody,
}

impl From<TempPhoto> for StagedFileBody {
    fn from(value: TempPhoto) -> Self {
        Self {
            temp_photo: TempPhotoRefBody {
                file_id: value.file_id,
                upload_id: value.upload_id.to_string(),
            },
        }
    }
}

/// Staged file as listed in a session snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TempPhotoBody {
    pub file_id: String,
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub index: u8,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<TempPhoto> for TempPhotoBody {
    fn from(value: TempPhoto) -> Self {
        Self {
            file_id: value.file_id,
            file_path: value.staging_key,
            file_size: value.size_bytes,
            mime_type: value.mime_type.as_str().to_owned(),
            index: value.staging_index,
            created_at: value.created_at,
        }
    }
}

/// Upload session projection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionBody {
    #[schema(format = "uuid")]
    pub upload_id: String,
    pub file_count: u8,
    pub status: UploadStatus,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
    pub temp_photos: Vec<TempPhotoBody>,
}

/// Response wrapper for a session snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionResponseBody {
    pub upload_session: UploadSessionBody,
}

impl From<UploadSessionSnapshot> for UploadSessionResponseBody {
    fn from(value: UploadSessionSnapshot) -> Self {
        let UploadSessionSnapshot {
            session,
            status,
            temp_photos,
        } = value;
        Self {
            upload_session: UploadSessionBody {
                upload_id: session.id().to_string(),
                file_count: session.file_count(),
                status,
                expires_at: session.expires_at(),
                temp_photos: temp_photos.into_iter().map(TempPhotoBody::from).collect(),
            },
        }
    }
}

/// Payload limit for direct uploads; oversize bodies are rejected before
/// they reach the handler.
pub fn payload_config() -> web::PayloadConfig {
    // One extra byte lets the service report the size limit itself.
    let limit = usize::try_from(MAX_DIRECT_UPLOAD_BYTES + 1).unwrap_or(usize::MAX);
    web::PayloadConfig::new(limit)
}

fn parse_upload_id(raw: &str) -> Result<UploadSessionId, Error> {
    parse_uuid(raw, FieldName::new("uploadId")).map(UploadSessionId::from_uuid)
}

fn parse_file_count(raw: i64) -> Result<u8, Error> {
    u8::try_from(raw).map_err(|_| {
        upload_validation_error(&UploadValidationError::FileCountOutOfRange {
            max: MAX_FILES_PER_SESSION,
        })
    })
}

fn parse_file_index(raw: &str) -> Result<u8, Error> {
    raw.parse::<u8>().map_err(|_| {
        out_of_range_error(
            FieldName::new("index"),
            format!("index must be between 0 and {}", MAX_FILES_PER_SESSION - 1),
        )
    })
}

/// Open an upload session with presigned staging URLs.
#[utoipa::path(
    post,
    path = "/api/v1/diaries/upload-session",
    request_body = CreateUploadSessionBody,
    responses(
        (status = 201, description = "Upload session opened", body = CreatedUploadSessionBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "createUploadSession",
    security(("BearerAuth" = []))
)]
#[post("/diaries/upload-session")]
pub async fn create_upload_session(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateUploadSessionBody>,
) -> ApiResult<HttpResponse> {
    let CreateUploadSessionBody {
        file_count,
        file_names,
    } = payload.into_inner();
    let created = state
        .uploads
        .create_session(CreateUploadSessionRequest {
            user_id: auth.user_id().clone(),
            file_count: parse_file_count(file_count)?,
            file_names,
        })
        .await?;
    Ok(envelope::created(CreatedUploadSessionBody::from(created)))
}

/// Confirm that a presigned upload landed.
#[utoipa::path(
    post,
    path = "/api/v1/diaries/upload-confirm",
    request_body = ConfirmUploadBody,
    responses(
        (status = 200, description = "File staged", body = StagedFileBody),
        (status = 400, description = "Invalid request or session", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Upload session not found", body = ErrorSchema),
        (status = 409, description = "File already confirmed", body = ErrorSchema),
        (status = 410, description = "Upload session expired", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "confirmUpload",
    security(("BearerAuth" = []))
)]
#[post("/diaries/upload-confirm")]
pub async fn confirm_upload(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<ConfirmUploadBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let staged = state
        .uploads
        .confirm_upload(ConfirmUploadRequest {
            user_id: auth.user_id().clone(),
            upload_id: parse_upload_id(&body.upload_id)?,
            file_id: body.file_id,
            staging_key: body.file_path,
            size_bytes: body.file_size,
            mime_type: body.mime_type,
        })
        .await?;
    Ok(envelope::ok(StagedFileBody::from(staged)))
}

/// Fetch an upload session with its staged files.
#[utoipa::path(
    get,
    path = "/api/v1/diaries/upload-session/{uploadId}",
    params(("uploadId" = String, Path, description = "Upload session identifier")),
    responses(
        (status = 200, description = "Upload session", body = UploadSessionResponseBody),
        (status = 400, description = "Invalid upload id", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Upload session not found", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "getUploadSession",
    security(("BearerAuth" = []))
)]
#[get("/diaries/upload-session/{upload_id}")]
pub async fn get_upload_session(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let upload_id = parse_upload_id(&path.into_inner())?;
    let snapshot = state
        .uploads_query
        .get_session(auth.user_id(), upload_id)
        .await?;
    Ok(envelope::ok(UploadSessionResponseBody::from(snapshot)))
}

/// Upload one file's bytes through the API instead of a presigned URL.
#[utoipa::path(
    put,
    path = "/api/v1/diaries/upload-session/{uploadId}/files/{index}",
    params(
        ("uploadId" = String, Path, description = "Upload session identifier"),
        ("index" = u8, Path, description = "Zero-based slot within the session")
    ),
    request_body(content = Vec<u8>, content_type = "image/*"),
    responses(
        (status = 201, description = "File staged", body = StagedFileBody),
        (status = 400, description = "Invalid request or session", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Upload session not found", body = ErrorSchema),
        (status = 409, description = "Slot already uploaded", body = ErrorSchema),
        (status = 410, description = "Upload session expired", body = ErrorSchema),
        (status = 413, description = "File too large")
    ),
    tags = ["uploads"],
    operation_id = "uploadFile",
    security(("BearerAuth" = []))
)]
#[put("/diaries/upload-session/{upload_id}/files/{index}")]
pub async fn upload_file(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (raw_upload_id, raw_index) = path.into_inner();
    let upload_id = parse_upload_id(&raw_upload_id)?;
    let index = parse_file_index(&raw_index)?;
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            field_error(
                FieldName::new("contentType"),
                "Content-Type header is required",
            )
        })?
        .to_owned();

    let staged = state
        .uploads
        .upload_file(DirectUploadRequest {
            user_id: auth.user_id().clone(),
            upload_id,
            index,
            content_type,
            bytes: body.to_vec(),
        })
        .await?;
    Ok(envelope::created(StagedFileBody::from(staged)))
}

#[cfg(test)]
#[path = "uploads_tests.rs"]
mod tests;

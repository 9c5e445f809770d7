//! Diary HTTP handlers.
//!
//! ```text
//! POST   /api/v1/diaries {"title","content","date","uploadId"?}
//! GET    /api/v1/diaries?page&limit
//! GET    /api/v1/diaries/{id}
//! PUT    /api/v1/diaries/{id} {"title"?,"content"?,"date"?}
//! DELETE /api/v1/diaries/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, NaiveDate, Utc};
use pagination::{PageInfo, PageRequest, PaginationError, Paginated};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::CreateDiaryRequest;
use crate::domain::{
    Diary, DiaryChanges, DiaryDraft, DiaryId, Error, Photo, UploadSessionId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::{ErrorSchema, PageInfoSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, out_of_range_error, parse_uuid};

/// Request body for creating a diary.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiaryBody {
    #[schema(example = "Spring walk")]
    pub title: String,
    #[schema(example = "Cherry blossoms along the river.")]
    pub content: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[schema(example = "2026-04-01")]
    pub date: String,
    /// Upload session whose staged photos become the diary's photos.
    #[schema(format = "uuid")]
    pub upload_id: Option<String>,
}

/// Request body for a partial diary update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiaryBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
}

/// Query string for listing diaries.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDiariesQuery {
    /// One-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 10, max 100).
    pub limit: Option<u32>,
}

/// Photo attached to a diary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoBody {
    #[schema(format = "uuid")]
    pub photo_id: String,
    pub file_path: String,
    pub thumbnail_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub order: u32,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<&Photo> for PhotoBody {
    fn from(value: &Photo) -> Self {
        Self {
            photo_id: value.id.to_string(),
            file_path: value.storage_key.clone(),
            thumbnail_path: value.thumbnail_key.clone(),
            file_size: value.size_bytes,
            mime_type: value.mime_type.as_str().to_owned(),
            order: value.order,
            created_at: value.created_at,
        }
    }
}

/// Diary with photos in display order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiaryBody {
    #[schema(format = "uuid")]
    pub diary_id: String,
    #[schema(format = "uuid")]
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[schema(value_type = String, format = Date, example = "2026-04-01")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
    pub photos: Vec<PhotoBody>,
}

impl From<&Diary> for DiaryBody {
    fn from(value: &Diary) -> Self {
        Self {
            diary_id: value.id().to_string(),
            user_id: value.user_id().to_string(),
            title: value.title().as_ref().to_owned(),
            content: value.content().as_ref().to_owned(),
            date: value.date(),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
            photos: value.photos().iter().map(PhotoBody::from).collect(),
        }
    }
}

/// Response wrapper for a single diary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiaryResponseBody {
    pub diary: DiaryBody,
}

impl From<Diary> for DiaryResponseBody {
    fn from(value: Diary) -> Self {
        Self {
            diary: DiaryBody::from(&value),
        }
    }
}

/// One page of diaries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiaryListBody {
    pub diaries: Vec<DiaryBody>,
    #[schema(value_type = PageInfoSchema)]
    pub pagination: PageInfo,
}

impl From<Paginated<Diary>> for DiaryListBody {
    fn from(value: Paginated<Diary>) -> Self {
        Self {
            diaries: value.items.iter().map(DiaryBody::from).collect(),
            pagination: value.pagination,
        }
    }
}

/// Confirmation returned after a delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedBody {
    #[schema(example = "Diary deleted successfully")]
    pub message: String,
}

fn parse_diary_id(raw: &str) -> Result<DiaryId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(DiaryId::from_uuid)
}

fn parse_optional_upload_id(raw: Option<String>) -> Result<Option<UploadSessionId>, Error> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| parse_uuid(&value, FieldName::new("uploadId")).map(UploadSessionId::from_uuid))
        .transpose()
}

fn page_request(query: &ListDiariesQuery) -> Result<PageRequest, Error> {
    PageRequest::new(query.page, query.limit).map_err(|err| {
        let field = match err {
            PaginationError::PageOutOfRange => "page",
            PaginationError::LimitOutOfRange { .. } => "limit",
        };
        out_of_range_error(FieldName::new(field), err.to_string())
    })
}

/// Create a diary, promoting staged photos when `uploadId` is given.
#[utoipa::path(
    post,
    path = "/api/v1/diaries",
    request_body = CreateDiaryBody,
    responses(
        (status = 201, description = "Diary created", body = DiaryResponseBody),
        (status = 400, description = "Invalid request or upload session", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 410, description = "Upload session expired", body = ErrorSchema),
        (status = 500, description = "Promotion failed", body = ErrorSchema)
    ),
    tags = ["diaries"],
    operation_id = "createDiary",
    security(("BearerAuth" = []))
)]
#[post("/diaries")]
pub async fn create_diary(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateDiaryBody>,
) -> ApiResult<HttpResponse> {
    let CreateDiaryBody {
        title,
        content,
        date,
        upload_id,
    } = payload.into_inner();
    let draft = DiaryDraft::try_from_parts(&title, &content, &date)?;
    let diary = state
        .diaries
        .create_diary(CreateDiaryRequest {
            user_id: auth.user_id().clone(),
            draft,
            upload_id: parse_optional_upload_id(upload_id)?,
        })
        .await?;
    Ok(envelope::created(DiaryResponseBody::from(diary)))
}

/// List the caller's diaries, newest date first.
#[utoipa::path(
    get,
    path = "/api/v1/diaries",
    params(ListDiariesQuery),
    responses(
        (status = 200, description = "Diary page", body = DiaryListBody),
        (status = 400, description = "Invalid pagination", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema)
    ),
    tags = ["diaries"],
    operation_id = "listDiaries",
    security(("BearerAuth" = []))
)]
#[get("/diaries")]
pub async fn list_diaries(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<ListDiariesQuery>,
) -> ApiResult<HttpResponse> {
    let page = page_request(&query)?;
    let diaries = state
        .diaries_query
        .list_diaries(auth.user_id(), page)
        .await?;
    Ok(envelope::ok(DiaryListBody::from(diaries)))
}

/// Fetch one of the caller's diaries.
#[utoipa::path(
    get,
    path = "/api/v1/diaries/{id}",
    params(("id" = String, Path, description = "Diary identifier")),
    responses(
        (status = 200, description = "Diary", body = DiaryResponseBody),
        (status = 400, description = "Invalid diary id", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Diary not found", body = ErrorSchema)
    ),
    tags = ["diaries"],
    operation_id = "getDiary",
    security(("BearerAuth" = []))
)]
#[get("/diaries/{id}")]
pub async fn get_diary(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let diary_id = parse_diary_id(&path.into_inner())?;
    let diary = state
        .diaries_query
        .get_diary(auth.user_id(), diary_id)
        .await?;
    Ok(envelope::ok(DiaryResponseBody::from(diary)))
}

/// Update the title, content or date of a diary.
#[utoipa::path(
    put,
    path = "/api/v1/diaries/{id}",
    params(("id" = String, Path, description = "Diary identifier")),
    request_body = UpdateDiaryBody,
    responses(
        (status = 200, description = "Diary updated", body = DiaryResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Diary not found", body = ErrorSchema)
    ),
    tags = ["diaries"],
    operation_id = "updateDiary",
    security(("BearerAuth" = []))
)]
#[put("/diaries/{id}")]
pub async fn update_diary(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<UpdateDiaryBody>,
) -> ApiResult<HttpResponse> {
    let diary_id = parse_diary_id(&path.into_inner())?;
    let UpdateDiaryBody {
        title,
        content,
        date,
    } = payload.into_inner();
    let changes =
        DiaryChanges::try_from_parts(title.as_deref(), content.as_deref(), date.as_deref())?;
    let diary = state
        .diaries
        .update_diary(auth.user_id(), diary_id, changes)
        .await?;
    Ok(envelope::ok(DiaryResponseBody::from(diary)))
}

/// Delete a diary and its photos.
#[utoipa::path(
    delete,
    path = "/api/v1/diaries/{id}",
    params(("id" = String, Path, description = "Diary identifier")),
    responses(
        (status = 200, description = "Diary deleted", body = DeletedBody),
        (status = 400, description = "Invalid diary id", body = ErrorSchema),
        (status = 401, description = "Missing bearer token", body = ErrorSchema),
        (status = 403, description = "Invalid or expired token", body = ErrorSchema),
        (status = 404, description = "Diary not found", body = ErrorSchema)
    ),
    tags = ["diaries"],
    operation_id = "deleteDiary",
    security(("BearerAuth" = []))
)]
#[delete("/diaries/{id}")]
pub async fn delete_diary(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let diary_id = parse_diary_id(&path.into_inner())?;
    state.diaries.delete_diary(auth.user_id(), diary_id).await?;
    Ok(envelope::ok(DeletedBody {
        message: "Diary deleted successfully".to_owned(),
    }))
}

#[cfg(test)]
#[path = "diaries_tests.rs"]
mod tests;

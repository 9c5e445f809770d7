//! Tests for upload session HTTP handlers.

use super::*;
use crate::domain::ports::{MockUploadSessionCommand, MockUploadSessionQuery, PresignedTarget};
use crate::domain::{ImageMimeType, UploadSession};
use crate::inbound::http::test_utils::{
    StateBuilder, accepting_tokens, bearer, fixed_now, sample_user_id,
};
use crate::inbound::http::validation::{json_config, path_config};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::TimeDelta;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn session() -> UploadSession {
    UploadSession::open(sample_user_id(), 2, fixed_now()).expect("valid session")
}

fn temp_photo(session: &UploadSession, index: u8) -> TempPhoto {
    TempPhoto {
        upload_id: session.id(),
        file_id: format!("{}-{index}", session.id()),
        staging_index: index,
        staging_key: format!("{}{}-{index}.jpg", session.staging_prefix(), session.id()),
        size_bytes: 2_048,
        mime_type: ImageMimeType::Jpeg,
        created_at: fixed_now(),
    }
}

async fn send(
    state: StateBuilder,
    req: actix_test::TestRequest,
) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(state.tokens(accepting_tokens()).build())
            .app_data(json_config())
            .app_data(path_config())
            .app_data(payload_config())
            .service(
                web::scope("/api/v1")
                    .service(create_upload_session)
                    .service(confirm_upload)
                    .service(get_upload_session)
                    .service(upload_file),
            ),
    )
    .await;
    let res = actix_test::call_service(&app, req.insert_header(bearer()).to_request()).await;
    let status = res.status();
    (status, actix_test::read_body_json(res).await)
}

#[rstest]
#[actix_web::test]
async fn create_returns_presigned_targets(session: UploadSession) {
    let upload_id = session.id().to_string();
    let targets: Vec<PresignedTarget> = session
        .plan_targets(&["a.jpg".to_owned(), "b.png".to_owned()])
        .expect("targets")
        .into_iter()
        .map(|target| PresignedTarget {
            upload_url: format!("https://store.test/{}", target.staging_key),
            expires_at: fixed_now() + TimeDelta::minutes(5),
            target,
        })
        .collect();
    let mut uploads = MockUploadSessionCommand::new();
    uploads
        .expect_create_session()
        .withf(|request| {
            request.file_count == 2 && request.user_id == sample_user_id()
        })
        .times(1)
        .return_once(move |_| Ok(CreatedUploadSession { session, targets }));

    let (status, body) = send(
        StateBuilder::default().uploads(uploads),
        actix_test::TestRequest::post()
            .uri("/api/v1/diaries/upload-session")
            .set_json(json!({"fileCount": 2, "fileNames": ["a.jpg", "b.png"]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["uploadId"], json!(upload_id));
    let urls = body["data"]["presignedUrls"].as_array().expect("urls");
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[1]["fileId"], json!(format!("{upload_id}-1")));
    assert_eq!(urls[1]["contentType"], json!("image/png"));
    assert!(
        urls[0]["filePath"]
            .as_str()
            .is_some_and(|path| path.starts_with("uploads/"))
    );
}

#[rstest]
#[case(300)]
#[case(-1)]
#[actix_web::test]
async fn create_rejects_unrepresentable_file_counts(#[case] file_count: i64) {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::post()
            .uri("/api/v1/diaries/upload-session")
            .set_json(json!({"fileCount": file_count, "fileNames": ["a.jpg"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!("fileCount"));
}

#[rstest]
#[actix_web::test]
async fn confirm_forwards_fields_to_the_service(session: UploadSession) {
    let staged = temp_photo(&session, 0);
    let file_id = staged.file_id.clone();
    let staging_key = staged.staging_key.clone();
    let upload_id = session.id();
    let mut uploads = MockUploadSessionCommand::new();
    let expected_key = staging_key.clone();
    uploads
        .expect_confirm_upload()
        .withf(move |request| {
            request.upload_id == upload_id
                && request.staging_key == expected_key
                && request.size_bytes == 2_048
                && request.mime_type == "image/jpeg"
        })
        .times(1)
        .return_once(move |_| Ok(staged));

    let (status, body) = send(
        StateBuilder::default().uploads(uploads),
        actix_test::TestRequest::post()
            .uri("/api/v1/diaries/upload-confirm")
            .set_json(json!({
                "uploadId": upload_id.to_string(),
                "fileId": file_id,
                "filePath": staging_key,
                "fileSize": 2_048,
                "mimeType": "image/jpeg",
            })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tempPhoto"]["fileId"], json!(file_id));
    assert_eq!(body["data"]["tempPhoto"]["uploadId"], json!(upload_id.to_string()));
}

#[rstest]
#[actix_web::test]
async fn confirm_rejects_malformed_upload_id() {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::post()
            .uri("/api/v1/diaries/upload-confirm")
            .set_json(json!({
                "uploadId": "nope",
                "fileId": "x",
                "filePath": "y",
                "fileSize": 1,
                "mimeType": "image/jpeg",
            })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["code"], json!("invalid_uuid"));
}

#[rstest]
#[actix_web::test]
async fn confirm_on_expired_session_is_gone(session: UploadSession) {
    let mut uploads = MockUploadSessionCommand::new();
    uploads
        .expect_confirm_upload()
        .return_once(|_| Err(Error::upload_session_expired("Upload session has expired")));

    let (status, body) = send(
        StateBuilder::default().uploads(uploads),
        actix_test::TestRequest::post()
            .uri("/api/v1/diaries/upload-confirm")
            .set_json(json!({
                "uploadId": session.id().to_string(),
                "fileId": format!("{}-0", session.id()),
                "filePath": "uploads/x",
                "fileSize": 1,
                "mimeType": "image/jpeg",
            })),
    )
    .await;

    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"]["code"], json!("UPLOAD_SESSION_EXPIRED"));
}

#[rstest]
#[actix_web::test]
async fn get_projects_session_and_staged_files(session: UploadSession) {
    let upload_id = session.id();
    let staged = vec![temp_photo(&session, 0)];
    let mut query = MockUploadSessionQuery::new();
    query
        .expect_get_session()
        .withf(move |user_id, id| *user_id == sample_user_id() && *id == upload_id)
        .times(1)
        .return_once(move |_, _| {
            Ok(UploadSessionSnapshot {
                session,
                status: UploadStatus::Expired,
                temp_photos: staged,
            })
        });

    let (status, body) = send(
        StateBuilder::default().uploads_query(query),
        actix_test::TestRequest::get().uri(&format!("/api/v1/diaries/upload-session/{upload_id}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let projected = &body["data"]["uploadSession"];
    assert_eq!(projected["status"], json!("expired"));
    assert_eq!(projected["fileCount"], json!(2));
    assert_eq!(projected["tempPhotos"][0]["fileSize"], json!(2_048));
    assert_eq!(projected["tempPhotos"][0]["mimeType"], json!("image/jpeg"));
}

#[rstest]
#[actix_web::test]
async fn get_hides_foreign_sessions() {
    let mut query = MockUploadSessionQuery::new();
    query
        .expect_get_session()
        .return_once(|_, _| Err(Error::not_found("Upload session not found")));

    let (status, _) = send(
        StateBuilder::default().uploads_query(query),
        actix_test::TestRequest::get().uri(&format!(
            "/api/v1/diaries/upload-session/{}",
            UploadSessionId::random()
        )),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn direct_upload_passes_bytes_and_content_type(session: UploadSession) {
    let upload_id = session.id();
    let staged = temp_photo(&session, 1);
    let mut uploads = MockUploadSessionCommand::new();
    uploads
        .expect_upload_file()
        .withf(move |request| {
            request.upload_id == upload_id
                && request.index == 1
                && request.content_type == "image/png"
                && request.bytes == b"\x89PNG".to_vec()
        })
        .times(1)
        .return_once(move |_| Ok(staged));

    let (status, body) = send(
        StateBuilder::default().uploads(uploads),
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/diaries/upload-session/{upload_id}/files/1"))
            .insert_header((CONTENT_TYPE, "image/png"))
            .set_payload(b"\x89PNG".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tempPhoto"]["fileId"], json!(format!("{upload_id}-1")));
}

#[rstest]
#[actix_web::test]
async fn direct_upload_requires_content_type(session: UploadSession) {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/diaries/upload-session/{}/files/0", session.id()))
            .set_payload(b"bytes".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!("contentType"));
}

#[rstest]
#[actix_web::test]
async fn direct_upload_rejects_non_numeric_index(session: UploadSession) {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/diaries/upload-session/{}/files/first", session.id()))
            .insert_header((CONTENT_TYPE, "image/jpeg"))
            .set_payload(b"bytes".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!("index"));
}

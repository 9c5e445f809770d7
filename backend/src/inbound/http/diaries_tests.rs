//! Tests for diary HTTP handlers.

use super::*;
use crate::domain::ports::{MockDiaryCommand, MockDiaryQuery};
use crate::domain::{DiaryTitle, ImageMimeType, TempPhoto, plan_promotion};
use crate::inbound::http::test_utils::{
    StateBuilder, accepting_tokens, bearer, fixed_now, sample_user_id,
};
use crate::inbound::http::validation::{json_config, path_config, query_config};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn diary() -> Diary {
    let draft = DiaryDraft::try_from_parts("Spring walk", "Cherry blossoms.", "2026-04-01")
        .expect("valid draft");
    Diary::create(sample_user_id(), draft, fixed_now())
}

fn with_two_photos(diary: Diary) -> Diary {
    let upload_id = UploadSessionId::random();
    let staged = (0..2_u8)
        .map(|index| TempPhoto {
            upload_id,
            file_id: format!("{upload_id}-{index}"),
            staging_index: index,
            staging_key: format!("uploads/u/{upload_id}/{upload_id}-{index}.jpg"),
            size_bytes: 512,
            mime_type: ImageMimeType::Jpeg,
            created_at: fixed_now(),
        })
        .collect();
    let photos = plan_promotion(&diary, staged, fixed_now())
        .into_iter()
        .map(|step| step.photo)
        .collect();
    diary.with_photos(photos)
}

async fn send(state: StateBuilder, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(state.tokens(accepting_tokens()).build())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .service(
                web::scope("/api/v1")
                    .service(create_diary)
                    .service(list_diaries)
                    .service(get_diary)
                    .service(update_diary)
                    .service(delete_diary),
            ),
    )
    .await;
    let res = actix_test::call_service(&app, req.insert_header(bearer()).to_request()).await;
    let status = res.status();
    (status, actix_test::read_body_json(res).await)
}

#[rstest]
#[actix_web::test]
async fn create_without_upload_returns_diary(diary: Diary) {
    let mut diaries = MockDiaryCommand::new();
    diaries
        .expect_create_diary()
        .withf(|request| request.upload_id.is_none() && request.user_id == sample_user_id())
        .times(1)
        .return_once(move |_| Ok(diary));

    let (status, body) = send(
        StateBuilder::default().diaries(diaries),
        actix_test::TestRequest::post().uri("/api/v1/diaries").set_json(json!({
            "title": "Spring walk",
            "content": "Cherry blossoms.",
            "date": "2026-04-01",
            "uploadId": "",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["diary"]["title"], json!("Spring walk"));
    assert_eq!(body["data"]["diary"]["date"], json!("2026-04-01"));
    assert_eq!(body["data"]["diary"]["photos"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn create_with_upload_renders_photos_in_order(diary: Diary) {
    let upload_id = UploadSessionId::random();
    let promoted = with_two_photos(diary);
    let mut diaries = MockDiaryCommand::new();
    diaries
        .expect_create_diary()
        .withf(move |request| request.upload_id == Some(upload_id))
        .times(1)
        .return_once(move |_| Ok(promoted));

    let (status, body) = send(
        StateBuilder::default().diaries(diaries),
        actix_test::TestRequest::post().uri("/api/v1/diaries").set_json(json!({
            "title": "Spring walk",
            "content": "Cherry blossoms.",
            "date": "2026-04-01",
            "uploadId": upload_id.to_string(),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let photos = body["data"]["diary"]["photos"].as_array().expect("photos");
    let orders: Vec<u64> = photos.iter().filter_map(|p| p["order"].as_u64()).collect();
    assert_eq!(orders, vec![0, 1]);
    assert_eq!(photos[0]["filePath"], photos[0]["thumbnailPath"]);
}

#[rstest]
#[case(json!({"title": "", "content": "c", "date": "2026-04-01"}), "title")]
#[case(json!({"title": "t", "content": "c", "date": "tomorrow"}), "date")]
#[case(json!({"title": "t", "content": "c", "date": "2026-04-01", "uploadId": "x"}), "uploadId")]
#[actix_web::test]
async fn create_rejects_invalid_payloads(#[case] payload: Value, #[case] field: &str) {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::post()
            .uri("/api/v1/diaries")
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert_eq!(body["error"]["details"]["field"], json!(field));
}

#[rstest]
#[case(Error::invalid_upload_session("Upload session not found or already used"), StatusCode::BAD_REQUEST, "INVALID_UPLOAD_SESSION")]
#[case(Error::upload_session_expired("Upload session has expired"), StatusCode::GONE, "UPLOAD_SESSION_EXPIRED")]
#[actix_web::test]
async fn create_surfaces_session_failures(
    #[case] error: Error,
    #[case] expected_status: StatusCode,
    #[case] code: &str,
) {
    let mut diaries = MockDiaryCommand::new();
    diaries.expect_create_diary().return_once(move |_| Err(error));

    let (status, body) = send(
        StateBuilder::default().diaries(diaries),
        actix_test::TestRequest::post().uri("/api/v1/diaries").set_json(json!({
            "title": "t",
            "content": "c",
            "date": "2026-04-01",
            "uploadId": UploadSessionId::random().to_string(),
        })),
    )
    .await;

    assert_eq!(status, expected_status);
    assert_eq!(body["error"]["code"], json!(code));
}

#[rstest]
#[actix_web::test]
async fn list_returns_page_metadata(diary: Diary) {
    let mut query = MockDiaryQuery::new();
    query
        .expect_list_diaries()
        .withf(|_, page| page.page() == 2 && page.limit() == 1)
        .times(1)
        .return_once(move |_, page| Ok(Paginated::new(vec![diary], page, 3)));

    let (status, body) = send(
        StateBuilder::default().diaries_query(query),
        actix_test::TestRequest::get().uri("/api/v1/diaries?page=2&limit=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["diaries"].as_array().map(Vec::len), Some(1));
    assert_eq!(
        body["data"]["pagination"],
        json!({"page": 2, "limit": 1, "total": 3, "totalPages": 3})
    );
}

#[rstest]
#[case("/api/v1/diaries?limit=101", "limit")]
#[case("/api/v1/diaries?page=0", "page")]
#[actix_web::test]
async fn list_rejects_out_of_range_pagination(#[case] uri: &str, #[case] field: &str) {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::get().uri(uri),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!(field));
}

#[rstest]
#[actix_web::test]
async fn list_rejects_non_numeric_pagination() {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::get().uri("/api/v1/diaries?page=abc"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[rstest]
#[actix_web::test]
async fn get_returns_not_found_for_foreign_diary() {
    let mut query = MockDiaryQuery::new();
    query
        .expect_get_diary()
        .return_once(|_, _| Err(Error::not_found("Diary not found")));

    let (status, body) = send(
        StateBuilder::default().diaries_query(query),
        actix_test::TestRequest::get().uri(&format!("/api/v1/diaries/{}", DiaryId::random())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], json!("Diary not found"));
}

#[rstest]
#[actix_web::test]
async fn get_rejects_malformed_id() {
    let (status, body) = send(
        StateBuilder::default(),
        actix_test::TestRequest::get().uri("/api/v1/diaries/not-a-uuid"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], json!("id"));
}

#[rstest]
#[actix_web::test]
async fn update_passes_only_supplied_fields(mut diary: Diary) {
    let diary_id = diary.id();
    let changes = DiaryChanges::try_from_parts(Some("Renamed"), None, None).expect("changes");
    diary.apply(changes, fixed_now());
    let mut diaries = MockDiaryCommand::new();
    diaries
        .expect_update_diary()
        .withf(move |_, id, changes| {
            *id == diary_id
                && changes.title == DiaryTitle::new("Renamed").ok()
                && changes.content.is_none()
                && changes.date.is_none()
        })
        .times(1)
        .return_once(move |_, _, _| Ok(diary));

    let (status, body) = send(
        StateBuilder::default().diaries(diaries),
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/diaries/{diary_id}"))
            .set_json(json!({"title": "Renamed"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["diary"]["title"], json!("Renamed"));
    assert_eq!(body["data"]["diary"]["content"], json!("Cherry blossoms."));
}

#[rstest]
#[actix_web::test]
async fn delete_reports_success_then_not_found() {
    let diary_id = DiaryId::random();
    let mut diaries = MockDiaryCommand::new();
    let mut seq = mockall::Sequence::new();
    diaries
        .expect_delete_diary()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    diaries
        .expect_delete_diary()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(Error::not_found("Diary not found")));
    let state = StateBuilder::default()
        .diaries(diaries)
        .tokens(accepting_tokens())
        .build();
    let app = actix_test::init_service(
        App::new()
            .app_data(state)
            .service(web::scope("/api/v1").service(delete_diary)),
    )
    .await;

    let uri = format!("/api/v1/diaries/{diary_id}");
    let first = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(first).await;
    assert_eq!(body["data"]["message"], json!("Diary deleted successfully"));

    let second = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn requests_without_token_are_unauthorised() {
    let app = actix_test::init_service(
        App::new()
            .app_data(StateBuilder::default().build())
            .service(web::scope("/api/v1").service(list_diaries)),
    )
    .await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/diaries")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

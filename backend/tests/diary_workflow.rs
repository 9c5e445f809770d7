//! End-to-end diary workflows over the in-memory adapters.

mod support;

use chrono::TimeDelta;
use diary_backend::domain::ports::{
    ConfirmUploadRequest, CreateDiaryRequest, CreateUploadSessionRequest,
};
use diary_backend::domain::{
    DiaryChanges, DiaryDraft, ErrorCode, LoginCredentials, SignupDetails, UploadSessionId,
    UploadStatus, UserId,
};
use pagination::PageRequest;
use rstest::{fixture, rstest};
use support::{Backend, PASSWORD};

#[fixture]
fn backend() -> Backend {
    Backend::new()
}

fn draft(title: &str, date: &str) -> DiaryDraft {
    DiaryDraft::try_from_parts(title, "A day worth keeping.", date).expect("valid draft")
}

fn request(user_id: &UserId, date: &str, upload_id: Option<UploadSessionId>) -> CreateDiaryRequest {
    CreateDiaryRequest {
        user_id: user_id.clone(),
        draft: draft("Entry", date),
        upload_id,
    }
}

#[rstest]
#[tokio::test]
async fn signup_token_authenticates_and_login_issues_another(backend: Backend) {
    let session = backend.signup("ada@example.com").await;
    let identity = backend
        .ports
        .tokens
        .authenticate(session.token.as_ref())
        .expect("issued token verifies");
    assert_eq!(&identity.user_id, session.user.id());

    let credentials =
        LoginCredentials::try_from_parts("ADA@example.com", PASSWORD).expect("credentials");
    let login = backend.ports.accounts.login(credentials).await.expect("login");
    assert_eq!(login.user.id(), session.user.id());

    let wrong = LoginCredentials::try_from_parts("ada@example.com", "not the password")
        .expect("credentials");
    let err = backend.ports.accounts.login(wrong).await.expect_err("wrong password");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn duplicate_signup_conflicts(backend: Backend) {
    backend.signup("ada@example.com").await;
    let details =
        SignupDetails::try_from_parts("ada@example.com", PASSWORD, "Other").expect("valid signup");
    let err = backend.ports.accounts.signup(details).await.expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn promotion_attaches_photos_in_staging_order(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let upload_id = backend.stage_photos(user.id(), 3).await;

    let diary = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect("diary created");

    let orders: Vec<u32> = diary.photos().iter().map(|photo| photo.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    for photo in diary.photos() {
        assert!(backend.store.contains(&photo.storage_key).await);
        assert_eq!(photo.thumbnail_key, photo.storage_key);
    }

    let snapshot = backend
        .ports
        .uploads_query
        .get_session(user.id(), upload_id)
        .await
        .expect("session readable");
    assert_eq!(snapshot.status, UploadStatus::Completed);

    let fetched = backend
        .ports
        .diaries_query
        .get_diary(user.id(), diary.id())
        .await
        .expect("diary readable");
    assert_eq!(fetched, diary);
}

#[rstest]
#[tokio::test]
async fn a_session_promotes_at_most_once(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let upload_id = backend.stage_photos(user.id(), 1).await;

    backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect("first promotion");
    let err = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-31", Some(upload_id)))
        .await
        .expect_err("second promotion");

    assert_eq!(err.code(), ErrorCode::InvalidUploadSession);
    let page = backend
        .ports
        .diaries_query
        .list_diaries(user.id(), PageRequest::default())
        .await
        .expect("list");
    assert_eq!(page.pagination.total, 1);
}

#[rstest]
#[tokio::test]
async fn concurrent_promotions_yield_exactly_one_diary(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let upload_id = backend.stage_photos(user.id(), 2).await;

    let (first, second) = tokio::join!(
        backend
            .ports
            .diaries
            .create_diary(request(user.id(), "2026-05-30", Some(upload_id))),
        backend
            .ports
            .diaries
            .create_diary(request(user.id(), "2026-05-30", Some(upload_id))),
    );

    assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
}

#[rstest]
#[tokio::test]
async fn expired_sessions_are_rejected_without_creating_a_diary(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let upload_id = backend.stage_photos(user.id(), 1).await;
    backend.clock.advance(TimeDelta::hours(1) + TimeDelta::seconds(1));

    let err = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect_err("expired session");

    assert_eq!(err.code(), ErrorCode::UploadSessionExpired);
    let page = backend
        .ports
        .diaries_query
        .list_diaries(user.id(), PageRequest::default())
        .await
        .expect("list");
    assert!(page.items.is_empty());

    let snapshot = backend
        .ports
        .uploads_query
        .get_session(user.id(), upload_id)
        .await
        .expect("session readable");
    assert_eq!(snapshot.status, UploadStatus::Expired);
}

#[rstest]
#[tokio::test]
async fn failed_copy_leaves_session_pending_and_no_diary(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let upload_id = backend.stage_photos(user.id(), 2).await;
    backend.store.fail_copies(true);

    let err = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect_err("copy fails");
    assert_ne!(err.code(), ErrorCode::InvalidUploadSession);

    let page = backend
        .ports
        .diaries_query
        .list_diaries(user.id(), PageRequest::default())
        .await
        .expect("list");
    assert!(page.items.is_empty());

    let snapshot = backend
        .ports
        .uploads_query
        .get_session(user.id(), upload_id)
        .await
        .expect("session readable");
    assert_eq!(snapshot.status, UploadStatus::Pending);
    assert_eq!(snapshot.temp_photos.len(), 2);

    backend.store.fail_copies(false);
    let diary = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect("retry succeeds");
    assert_eq!(diary.photos().len(), 2);
}

#[rstest]
#[tokio::test]
async fn empty_staged_objects_are_not_recorded(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let created = backend
        .ports
        .uploads
        .create_session(CreateUploadSessionRequest {
            user_id: user.id().clone(),
            file_count: 1,
            file_names: vec!["blank.jpg".to_owned()],
        })
        .await
        .expect("session opens");
    let target = &created.targets[0].target;
    backend
        .store
        .insert(&target.staging_key, "image/jpeg", Vec::new())
        .await;

    let err = backend
        .ports
        .uploads
        .confirm_upload(ConfirmUploadRequest {
            user_id: user.id().clone(),
            upload_id: created.session.id(),
            file_id: target.file_id.clone(),
            staging_key: target.staging_key.clone(),
            size_bytes: 1_024,
            mime_type: "image/jpeg".to_owned(),
        })
        .await
        .expect_err("empty object");
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let snapshot = backend
        .ports
        .uploads_query
        .get_session(user.id(), created.session.id())
        .await
        .expect("session readable");
    assert!(snapshot.temp_photos.is_empty());
}

#[rstest]
#[tokio::test]
async fn sessions_are_invisible_to_other_users(backend: Backend) {
    let owner = backend.signup("ada@example.com").await.user;
    let other = backend.signup("bob@example.com").await.user;
    let upload_id = backend.stage_photos(owner.id(), 1).await;

    let err = backend
        .ports
        .diaries
        .create_diary(request(other.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect_err("foreign session");
    assert_eq!(err.code(), ErrorCode::InvalidUploadSession);

    let err = backend
        .ports
        .uploads_query
        .get_session(other.id(), upload_id)
        .await
        .expect_err("foreign read");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn listing_pages_newest_date_first(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    for day in ["2026-05-01", "2026-05-03", "2026-05-02"] {
        backend
            .ports
            .diaries
            .create_diary(request(user.id(), day, None))
            .await
            .expect("diary created");
    }

    let page = backend
        .ports
        .diaries_query
        .list_diaries(user.id(), PageRequest::new(Some(1), Some(2)).expect("page"))
        .await
        .expect("first page");
    let dates: Vec<String> = page.items.iter().map(|d| d.date().to_string()).collect();
    assert_eq!(dates, vec!["2026-05-03", "2026-05-02"]);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.total_pages, 2);

    let last = backend
        .ports
        .diaries_query
        .list_diaries(user.id(), PageRequest::new(Some(2), Some(2)).expect("page"))
        .await
        .expect("second page");
    assert_eq!(last.items.len(), 1);
    assert!(
        last.items
            .iter()
            .all(|diary| page.items.iter().all(|seen| seen.id() != diary.id())),
        "page 2 repeats an item from page 1"
    );
}

#[rstest]
#[tokio::test]
async fn updates_touch_only_supplied_fields(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let diary = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-01", None))
        .await
        .expect("diary created");
    backend.clock.advance(TimeDelta::minutes(5));

    let changes = DiaryChanges::try_from_parts(None, None, Some("2026-05-02")).expect("changes");
    let updated = backend
        .ports
        .diaries
        .update_diary(user.id(), diary.id(), changes)
        .await
        .expect("updated");

    assert_eq!(updated.title(), diary.title());
    assert_eq!(updated.content(), diary.content());
    assert_eq!(updated.date().to_string(), "2026-05-02");
    assert!(updated.updated_at() > diary.updated_at());
}

#[rstest]
#[tokio::test]
async fn delete_removes_photos_and_succeeds_once(backend: Backend) {
    let user = backend.signup("ada@example.com").await.user;
    let upload_id = backend.stage_photos(user.id(), 2).await;
    let diary = backend
        .ports
        .diaries
        .create_diary(request(user.id(), "2026-05-30", Some(upload_id)))
        .await
        .expect("diary created");

    backend
        .ports
        .diaries
        .delete_diary(user.id(), diary.id())
        .await
        .expect("first delete");
    for photo in diary.photos() {
        assert!(!backend.store.contains(&photo.storage_key).await);
    }

    let err = backend
        .ports
        .diaries
        .delete_diary(user.id(), diary.id())
        .await
        .expect_err("second delete");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

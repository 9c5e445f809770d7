//! Tests for diary validation and promotion planning.

use chrono::{TimeDelta, TimeZone};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::UploadSessionId;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn diary(now: DateTime<Utc>) -> Diary {
    let draft = DiaryDraft::try_from_parts("Spring walk", "Cherry blossoms.", "2026-04-01")
        .expect("valid draft");
    Diary::create(UserId::random(), draft, now)
}

fn temp_photo(index: u8, ext: &str, created_at: DateTime<Utc>) -> TempPhoto {
    let upload_id = UploadSessionId::random();
    TempPhoto {
        upload_id,
        file_id: format!("{upload_id}-{index}"),
        staging_index: index,
        staging_key: format!("uploads/u/{upload_id}/{upload_id}-{index}.{ext}"),
        size_bytes: 1_000 + u64::from(index),
        mime_type: ImageMimeType::Jpeg,
        created_at,
    }
}

#[rstest]
#[case("", "body", "2026-01-01", "title")]
#[case("t", "   ", "2026-01-01", "content")]
#[case("t", "body", "yesterday", "date")]
#[case("t", "body", "2026-02-30", "date")]
fn draft_reports_offending_field(
    #[case] title: &str,
    #[case] content: &str,
    #[case] date: &str,
    #[case] field: &str,
) {
    let err = DiaryDraft::try_from_parts(title, content, date).expect_err("invalid draft");
    assert_eq!(err.field(), field);
}

#[rstest]
fn draft_enforces_length_limits() {
    let long_title = "t".repeat(TITLE_MAX + 1);
    let err = DiaryDraft::try_from_parts(&long_title, "body", "2026-01-01").expect_err("too long");
    assert_eq!(err, DiaryValidationError::TitleTooLong { max: TITLE_MAX });

    let long_content = "c".repeat(CONTENT_MAX + 1);
    let err = DiaryDraft::try_from_parts("t", &long_content, "2026-01-01").expect_err("too long");
    assert_eq!(err, DiaryValidationError::ContentTooLong { max: CONTENT_MAX });
}

#[rstest]
fn apply_updates_only_supplied_fields(mut diary: Diary, now: DateTime<Utc>) {
    let changes = DiaryChanges::try_from_parts(Some("  New title "), None, Some("2026-04-03"))
        .expect("valid changes");
    let later = now + TimeDelta::minutes(5);
    diary.apply(changes, later);

    assert_eq!(diary.title().as_ref(), "New title");
    assert_eq!(diary.content().as_ref(), "Cherry blossoms.");
    assert_eq!(
        diary.date(),
        NaiveDate::from_ymd_opt(2026, 4, 3).expect("date")
    );
    assert_eq!(diary.updated_at(), later);
    assert_eq!(diary.created_at(), now);
}

#[rstest]
fn plan_promotion_orders_by_staging_index(diary: Diary, now: DateTime<Utc>) {
    let staged = vec![
        temp_photo(2, "png", now),
        temp_photo(0, "jpg", now + TimeDelta::seconds(2)),
        temp_photo(1, "heic", now + TimeDelta::seconds(1)),
    ];

    let plan = plan_promotion(&diary, staged, now);

    let orders: Vec<u32> = plan.iter().map(|step| step.photo.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    let sizes: Vec<u64> = plan.iter().map(|step| step.photo.size_bytes).collect();
    assert_eq!(sizes, vec![1_000, 1_001, 1_002]);

    for step in &plan {
        let prefix = format!("photos/{}/{}/{}.", diary.user_id(), diary.id(), step.photo.id);
        assert!(step.photo.storage_key.starts_with(&prefix));
        assert_eq!(step.photo.thumbnail_key, step.photo.storage_key);
        assert_eq!(step.photo.diary_id, diary.id());
    }
    let last = plan.last().expect("three steps");
    assert!(last.photo.storage_key.ends_with(".png"));
    assert!(last.staging_key.ends_with("-2.png"));
}

#[rstest]
fn plan_promotion_of_nothing_is_empty(diary: Diary, now: DateTime<Utc>) {
    assert!(plan_promotion(&diary, Vec::new(), now).is_empty());
}

#[rstest]
fn restore_sorts_photos_by_order(diary: Diary, now: DateTime<Utc>) {
    let plan = plan_promotion(
        &diary,
        vec![temp_photo(0, "jpg", now), temp_photo(1, "jpg", now)],
        now,
    );
    let mut photos: Vec<Photo> = plan.into_iter().map(|step| step.photo).collect();
    photos.reverse();

    let restored = Diary::restore(DiaryRecord {
        id: diary.id(),
        user_id: diary.user_id().clone(),
        title: diary.title().clone(),
        content: diary.content().clone(),
        date: diary.date(),
        created_at: diary.created_at(),
        updated_at: diary.updated_at(),
        photos,
    });

    let orders: Vec<u32> = restored.photos().iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![0, 1]);
}

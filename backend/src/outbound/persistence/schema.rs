//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Lower-cased login email, unique.
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        display_name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Time-boxed upload sessions.
    upload_sessions (id) {
        id -> Uuid,
        user_id -> Uuid,
        file_count -> Int2,
        /// One of `pending`, `completed`, `expired`.
        status -> Varchar,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Files staged under an upload session, awaiting promotion.
    temp_photos (upload_id, file_id) {
        upload_id -> Uuid,
        file_id -> Varchar,
        staging_index -> Int2,
        staging_key -> Text,
        size_bytes -> Int8,
        mime_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Diary entries.
    diaries (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        content -> Text,
        /// Logical calendar date chosen by the author.
        diary_date -> Date,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Permanent photos; `(diary_id, sort_order)` is unique.
    photos (id) {
        id -> Uuid,
        diary_id -> Uuid,
        storage_key -> Text,
        thumbnail_key -> Text,
        size_bytes -> Int8,
        mime_type -> Varchar,
        sort_order -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(upload_sessions -> users (user_id));
diesel::joinable!(temp_photos -> upload_sessions (upload_id));
diesel::joinable!(diaries -> users (user_id));
diesel::joinable!(photos -> diaries (diary_id));

diesel::allow_tables_to_appear_in_same_query!(users, upload_sessions, temp_photos, diaries, photos);

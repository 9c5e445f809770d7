//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every validation failure carries `{"field", "code"}` details so clients can
//! highlight the offending input.

use actix_web::{HttpRequest, error::JsonPayloadError, error::PathError, error::QueryPayloadError, web};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    CredentialsValidationError, DiaryValidationError, Error, UploadValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidValue,
    InvalidUuid,
    OutOfRange,
    MalformedBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::MalformedBody => "malformed_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::validation(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn field_error(field: FieldName, message: impl Into<String>) -> Error {
    ValidationError::new(field.as_str(), message).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn out_of_range_error(field: FieldName, message: impl Into<String>) -> Error {
    ValidationError::new(field.as_str(), message).with_code(ErrorCode::OutOfRange)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    let name = field.as_str();
    Uuid::parse_str(value.trim()).map_err(|_| {
        ValidationError::new(name, format!("{name} must be a valid UUID"))
            .with_code(ErrorCode::InvalidUuid)
    })
}

impl From<CredentialsValidationError> for Error {
    fn from(err: CredentialsValidationError) -> Self {
        ValidationError::new(err.field(), err.to_string()).with_code(ErrorCode::InvalidValue)
    }
}

impl From<DiaryValidationError> for Error {
    fn from(err: DiaryValidationError) -> Self {
        ValidationError::new(err.field(), err.to_string()).with_code(ErrorCode::InvalidValue)
    }
}

pub(crate) fn upload_validation_error(err: &UploadValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(ErrorCode::InvalidValue)
}

fn malformed(field: &str, err: impl std::fmt::Display) -> actix_web::Error {
    ValidationError::new(field, err.to_string())
        .with_code(ErrorCode::MalformedBody)
        .into()
}

/// JSON extractor config answering malformed bodies with `VALIDATION_ERROR`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| malformed("body", err))
}

/// Query extractor config answering malformed query strings with `VALIDATION_ERROR`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err: QueryPayloadError, _req: &HttpRequest| malformed("query", err))
}

/// Path extractor config answering malformed segments with `VALIDATION_ERROR`.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err: PathError, _req: &HttpRequest| malformed("path", err))
}

//! Response envelopes shared by every API endpoint.
//!
//! Successful calls answer `{"success": true, "data": ...}`; failures answer
//! `{"success": false, "error": {...}}` via [`FailureEnvelope`].

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::Error;

/// Success wrapper around an endpoint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap `data` as a successful response body.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// Render the envelope with the given status.
    pub fn respond(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// Failure wrapper around a domain [`Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub error: Error,
}

impl FailureEnvelope {
    pub fn new(error: Error) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

/// `200 OK` with `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    Envelope::new(data).respond(StatusCode::OK)
}

/// `201 Created` with `data` in a success envelope.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    Envelope::new(data).respond(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn created_wraps_payload() {
        let response = created(json!({ "id": 7 }));
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = to_bytes(response.into_body()).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body, json!({ "success": true, "data": { "id": 7 } }));
    }

    #[rstest]
    fn failure_envelope_nests_error() {
        let value = serde_json::to_value(FailureEnvelope::new(Error::not_found("gone")))
            .expect("serialise");
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["code"], json!("NOT_FOUND"));
        assert_eq!(value["error"]["message"], json!("gone"));
        assert!(value["error"].get("details").is_none());
    }
}

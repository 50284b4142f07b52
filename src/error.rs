use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use derive_more::Display;
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Failure kinds surfaced to API callers.
#[derive(Debug, Display)]
pub enum HrError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    Validation(String),

    /// Malformed request body or query string.
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "storage failure: {}", _0)]
    Storage(StoreError),
}

impl HrError {
    pub fn employee_not_found() -> Self {
        HrError::NotFound("Employee not found".into())
    }
}

impl std::error::Error for HrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HrError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for HrError {
    fn from(e: StoreError) -> Self {
        HrError::Storage(e)
    }
}

impl ResponseError for HrError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrError::NotFound(_) => StatusCode::NOT_FOUND,
            HrError::Conflict(_) => StatusCode::CONFLICT,
            HrError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HrError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HrError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            HrError::Storage(e) => {
                error!(error = %e, "Storage operation failed");
                "Something went wrong, Contact with system admin".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "detail": detail }))
    }
}

/// Body deserialization failures: schema mismatches are validation errors,
/// anything else (bad JSON, wrong content type) is a bad request.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match &err {
        JsonPayloadError::Deserialize(e) if e.is_data() => HrError::Validation(e.to_string()).into(),
        _ => HrError::BadRequest(err.to_string()).into(),
    }
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    HrError::Validation(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UniqueKey;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(HrError::employee_not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(HrError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            HrError::Validation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            HrError::Storage(StoreError::Duplicate(UniqueKey::Email)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn storage_details_are_not_leaked() {
        let resp = HrError::Storage(StoreError::Corrupt("row 7".into())).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert!(!body["detail"].as_str().unwrap().contains("row 7"));
    }

    #[actix_web::test]
    async fn not_found_carries_message() {
        let resp = HrError::employee_not_found().error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(body, json!({ "detail": "Employee not found" }));
    }
}

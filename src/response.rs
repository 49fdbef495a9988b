//! Uniform response envelope shared by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ok, status, code, message, data}`
///
/// The HTTP status of the response always equals `status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    pub code: String,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn success(code: &str, message: &str) -> Self {
        Self {
            ok: true,
            status: StatusCode::OK.as_u16(),
            code: code.to_string(),
            message: message.to_string(),
            data: None,
        }
    }

    pub fn failure(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            ok: false,
            status: status.as_u16(),
            code: code.to_string(),
            message: message.to_string(),
            data: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status.as_u16();
        self
    }

    /// Attach a payload. Anything that fails to serialize is dropped as `null`.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        self.data = match serde_json::to_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to serialize response payload: {}", e);
                None
            }
        };
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::success("OK", "Products found")
            .with_data(json!({ "products": [] }));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "ok": true,
                "status": 200,
                "code": "OK",
                "message": "Products found",
                "data": { "products": [] }
            })
        );
    }

    #[test]
    fn test_failure_without_data_serializes_null() {
        let response = ApiResponse::failure(StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND", "User not found");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["status"], json!(404));
        assert!(value["data"].is_null());
    }

    #[test]
    fn test_http_status_follows_envelope() {
        let response = ApiResponse::success("OK", "created")
            .with_status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

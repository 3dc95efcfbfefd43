//! Uniform JSON response envelope for service handlers.
//!
//! Body shape: `{"code": 1, "msg": "", "data": ..., "id": "..."}` where
//! `code` is `1` for success and `0` for failure and `id` is omitted when unset.
//!
//! Values are immutable; every `with_*` call consumes the response and
//! returns a new one, so a half-built envelope is never shared.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

pub const CODE_OK: i32 = 1;
pub const CODE_ERROR: i32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    code: i32,
    #[serde(rename = "msg")]
    message: String,
    data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip)]
    stacks: Option<String>,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiResponse {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
            id: None,
            stacks: None,
            status: StatusCode::OK,
        }
    }

    pub fn ok() -> Self {
        Self::new(CODE_OK, "")
    }

    pub fn param_error() -> Self {
        Self::new(CODE_ERROR, "invalid parameters").with_status(StatusCode::BAD_REQUEST)
    }

    pub fn server_error() -> Self {
        Self::new(CODE_ERROR, "service error, please contact the administrator")
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn with_data<T: Serialize>(self, data: T) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Response data is not serializable");
            Value::Null
        });
        Self { data, ..self }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    /// Attach the request id so callers can quote it when reporting problems.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self
        }
    }

    /// Record the underlying error; it is logged, never sent to the client.
    pub fn with_stacks(self, err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %err, code = self.code, "Request failed");
        Self {
            stacks: Some(err.to_string()),
            ..self
        }
    }

    pub fn with_status(self, status: StatusCode) -> Self {
        Self { status, ..self }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn stacks(&self) -> Option<&str> {
        self.stacks.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub set_cookies: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            set_cookies: Vec::new(),
        }
    }

    /// Attach `Set-Cookie` values to the response
    pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = String>) -> Self {
        self.set_cookies.extend(cookies);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let mut response = (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": data_value
            })),
        )
            .into_response();

        append_set_cookies(&mut response, &self.set_cookies);
        response
    }
}

/// Append `Set-Cookie` headers, skipping any value that is not a valid header
pub fn append_set_cookies(response: &mut Response, cookies: &[String]) {
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Dropping malformed Set-Cookie value: {}", e),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

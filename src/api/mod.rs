//! REST API module.
//!
//! Contains all API routes and handlers. JSON responses use the
//! `{ success, data }` envelope; downloads are raw bodies.

mod bulk;
mod cards;
mod features;
mod members;
mod tasks;

pub use bulk::*;
pub use cards::*;
pub use features::*;
pub use members::*;
pub use tasks::*;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A file body with `Content-Type` and an attachment `Content-Disposition`.
pub struct Download {
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub extra_headers: Vec<(&'static str, String)>,
}

impl Download {
    pub fn new(content_type: &'static str, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type,
            file_name: file_name.into(),
            bytes,
            extra_headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.extra_headers.push((name, value.to_string()));
        self
    }
}

/// Attachment disposition with a plain `filename` and an RFC 6266
/// `filename*` carrying the percent-encoded UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let plain = file_name.replace('"', "");
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        plain,
        urlencoding::encode(&plain)
    )
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let disposition = content_disposition(&self.file_name);

        let mut response = (StatusCode::OK, self.bytes).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Ok(value) = HeaderValue::from_bytes(disposition.as_bytes()) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        for (name, value) in self.extra_headers {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
        response
    }
}

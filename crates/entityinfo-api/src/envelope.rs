//! Response envelope shared by every endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use entityinfo_core::defaults::{ENVELOPE_NUM_OF_PAGES, ENVELOPE_PAGE, ENVELOPE_TOTAL};

/// `{code, error_msg, page, total, num_of_pages, result}`.
///
/// The HTTP status always equals `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = JsonValue> {
    pub code: u16,
    pub error_msg: String,
    pub page: i64,
    pub total: i64,
    pub num_of_pages: i64,
    pub result: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 envelope with the default paging fields.
    pub fn ok(result: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            error_msg: String::new(),
            page: ENVELOPE_PAGE,
            total: ENVELOPE_TOTAL,
            num_of_pages: ENVELOPE_NUM_OF_PAGES,
            result,
        }
    }

    pub fn with_total(mut self, total: i64) -> Self {
        self.total = total;
        self
    }

    /// Paging fields of a page listing.
    pub fn with_page(mut self, page: i64, total: i64, num_of_pages: i64) -> Self {
        self.page = page;
        self.total = total;
        self.num_of_pages = num_of_pages;
        self
    }
}

impl ApiResponse<JsonValue> {
    /// An error envelope with an empty result list.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            error_msg: message.into(),
            page: ENVELOPE_PAGE,
            total: ENVELOPE_TOTAL,
            num_of_pages: ENVELOPE_NUM_OF_PAGES,
            result: JsonValue::Array(Vec::new()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

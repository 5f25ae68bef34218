//! API error mapping.
//!
//! Guard rejections and store errors carry distinct error kinds in the
//! response body so clients can tell "your query text was refused" from
//! "the store failed on your query".

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use starmart_adapter_pg::StoreError;
use starmart_guard::Verdict;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The guard refused the query text.
    #[error("query rejected ({code}): {detail}")]
    QueryRejected { code: &'static str, detail: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Build a rejection error from a non-accepted verdict.
    pub fn rejected(verdict: &Verdict) -> Self {
        ApiError::QueryRejected {
            code: verdict.reason.map(|r| r.code()).unwrap_or("rejected"),
            detail: verdict.detail.clone().unwrap_or_default(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::QueryRejected { .. } => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Query(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Connection(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::QueryRejected { .. } => "query_rejected",
            ApiError::Store(StoreError::NotFound { .. }) => "not_found",
            ApiError::Store(StoreError::InvalidPayload(_)) => "invalid_payload",
            ApiError::Store(StoreError::Query(_)) => "query_failed",
            ApiError::Store(StoreError::Connection(_)) => "store_unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request refused");
        }

        let body = match &self {
            ApiError::QueryRejected { code, detail } => json!({
                "error": self.kind(),
                "code": code,
                "detail": detail,
            }),
            ApiError::Store(err) => json!({
                "error": self.kind(),
                "detail": err.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starmart_guard::RejectReason;

    #[test]
    fn rejection_maps_to_bad_request() {
        let verdict = Verdict::rejected(RejectReason::ForbiddenKeyword, "keyword DROP");
        let err = ApiError::rejected(&verdict);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "query_rejected");
        match err {
            ApiError::QueryRejected { code, .. } => assert_eq!(code, "forbidden_keyword"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = ApiError::from(StoreError::NotFound {
            table: "dim_customer".to_string(),
            key: "customer_id".to_string(),
            id: 7,
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_query_failure_is_distinct_from_rejection() {
        let err = ApiError::from(StoreError::Query("syntax error".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "query_failed");
    }

    #[test]
    fn bad_payload_maps_to_bad_request() {
        let err = ApiError::from(StoreError::InvalidPayload("unknown column".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "invalid_payload");
    }
}

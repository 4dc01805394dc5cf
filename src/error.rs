//! Error taxonomy (spec §7) and its HTTP mapping at the RPC boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::codegen::CodegenError;

/// Sub-kinds of [`EngineError::IssuanceFailed`], kept for observability (logging, metrics)
/// without multiplying the top-level taxonomy the client sees.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceFailure {
    #[error("duplicate coupon code")]
    DuplicateCode,
    #[error("store unavailable")]
    StoreUnavailable,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// The error taxonomy returned to RPC callers. Raw adapter errors never reach the client body;
/// they are logged and converted here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("campaign-not-found: no campaign with the given id")]
    CampaignNotFound,

    #[error("not-started: the campaign has not reached its start instant")]
    NotStarted,

    #[error("sold-out: the campaign's coupon pool is exhausted")]
    SoldOut,

    #[error("issuance-failed: {0}")]
    IssuanceFailed(IssuanceFailure),

    #[error("invalid-argument: {0}")]
    InvalidArgument(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<CodegenError> for EngineError {
    fn from(e: CodegenError) -> Self {
        EngineError::Internal(e.to_string())
    }
}

impl EngineError {
    /// The stable taxonomy kind, used both in the HTTP error body and in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::CampaignNotFound => "campaign-not-found",
            EngineError::NotStarted => "not-started",
            EngineError::SoldOut => "sold-out",
            EngineError::IssuanceFailed(_) => "issuance-failed",
            EngineError::InvalidArgument(_) => "invalid-argument",
            EngineError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            EngineError::CampaignNotFound => StatusCode::NOT_FOUND,
            EngineError::NotStarted => StatusCode::CONFLICT,
            EngineError::SoldOut => StatusCode::CONFLICT,
            EngineError::IssuanceFailed(_) => StatusCode::BAD_GATEWAY,
            EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

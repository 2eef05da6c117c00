//! Unified error handling for the HTTP surface: a stable error code per
//! failure class, a consistent status mapping, and a JSON envelope.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mail::MailError;
use crate::store::StoreError;
use crate::telephony::TelephonyError;

/// Standardized error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    Mail(String),

    #[error("{0}")]
    Telephony(String),

    #[error("Storage error")]
    Store,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Mail(_) => "MAIL_ERROR",
            ApiError::Telephony(_) => "TELEPHONY_ERROR",
            ApiError::Store => "STORE_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Mail(_)
            | ApiError::Telephony(_)
            | ApiError::Store
            | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match status.as_u16() {
            400..=499 => log::warn!("Client error: {} ({})", self, status),
            _ => log::error!("Server error: {} ({})", self, status),
        }

        HttpResponse::build(status).json(ErrorResponse {
            code: self.code().to_string(),
            error: self.to_string(),
            timestamp: chrono::Utc::now(),
        })
    }
}

// Upstream failure details are logged at the source; clients get a
// generic message per failure class.

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        log::error!("Mail error: {}", err);
        ApiError::Mail("Mail operation failed".to_string())
    }
}

impl From<TelephonyError> for ApiError {
    fn from(err: TelephonyError) -> Self {
        log::error!("Telephony error: {}", err);
        ApiError::Telephony("Telephony operation failed".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::NotFound(key),
            other => {
                log::error!("Store error: {}", other);
                ApiError::Store
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound(42).into();
        assert!(matches!(err, ApiError::NotFound(42)));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ApiError::Unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(ApiError::BadRequest("x".to_string()).code(), "BAD_REQUEST");
        assert_eq!(ApiError::Store.code(), "STORE_ERROR");
    }
}

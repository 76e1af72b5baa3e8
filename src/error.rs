//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Why a hostname could not be turned into a tenant. The code is shown verbatim to the visitor.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionError {
    #[error("DOMAIN_NOT_FOUND")]
    DomainNotFound,
    #[error("DOMAIN_NOT_VERIFIED")]
    DomainNotVerified,
    #[error("WRONG_DOMAIN_TYPE")]
    WrongDomainType,
    #[error("TENANT_NOT_FOUND")]
    TenantNotFound,
    #[error("TENANT_INACTIVE")]
    TenantInactive,
    /// The lookup itself failed (store unavailable, bad row).
    #[error("RESOLUTION_ERROR")]
    Lookup,
    /// Development fallback found no active tenant at all.
    #[error("NO_TENANT_AVAILABLE")]
    NoTenantAvailable,
}

impl ResolutionError {
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::DomainNotFound => "DOMAIN_NOT_FOUND",
            ResolutionError::DomainNotVerified => "DOMAIN_NOT_VERIFIED",
            ResolutionError::WrongDomainType => "WRONG_DOMAIN_TYPE",
            ResolutionError::TenantNotFound => "TENANT_NOT_FOUND",
            ResolutionError::TenantInactive => "TENANT_INACTIVE",
            ResolutionError::Lookup => "RESOLUTION_ERROR",
            ResolutionError::NoTenantAvailable => "NO_TENANT_AVAILABLE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ResolutionError::DomainNotFound
            | ResolutionError::WrongDomainType
            | ResolutionError::TenantNotFound
            | ResolutionError::NoTenantAvailable => StatusCode::NOT_FOUND,
            ResolutionError::DomainNotVerified | ResolutionError::TenantInactive => StatusCode::FORBIDDEN,
            ResolutionError::Lookup => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl Serialize for ResolutionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("tenant resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
}

impl AppError {
    /// Turns a unique-constraint violation into `Conflict`; any other database error is kept.
    pub fn conflict_on_unique(e: sqlx::Error, message: impl Into<String>) -> AppError {
        let unique = e
            .as_database_error()
            .and_then(|d| d.code())
            .map(|c| c == "23505")
            .unwrap_or(false);
        if unique {
            AppError::Conflict(message.into())
        } else {
            AppError::Db(e)
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    tracing::error!(error = %e, "database error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Resolution(e) => (e.status(), e.code()),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Coarse classification of a failed generative-model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiErrorKind {
    ModelNotFound,
    QuotaExceeded,
    NetworkError,
    InvalidResponse,
    GenericError,
}

impl AiErrorKind {
    /// Message shown to end users for this kind of failure.
    pub fn user_message(self) -> &'static str {
        match self {
            AiErrorKind::ModelNotFound => {
                "We are updating our services. Please try again in a few seconds."
            }
            AiErrorKind::QuotaExceeded => {
                "Too many requests right now. Wait a few seconds and try again."
            }
            AiErrorKind::NetworkError => {
                "Connection error. Check your internet connection and try again."
            }
            AiErrorKind::InvalidResponse => {
                "We could not process your request. Try describing it another way."
            }
            AiErrorKind::GenericError => "A temporary error occurred. Please try again.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AiErrorKind::ModelNotFound => "MODEL_NOT_FOUND",
            AiErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            AiErrorKind::NetworkError => "NETWORK_ERROR",
            AiErrorKind::InvalidResponse => "INVALID_RESPONSE",
            AiErrorKind::GenericError => "GENERIC_ERROR",
        }
    }
}

/// A classified AI failure, keeping the raw provider message for logs.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}: {message}", kind.as_str())]
pub struct AiError {
    pub kind: AiErrorKind,
    pub message: String,
}

impl AiError {
    pub fn new(kind: AiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Premium subscription required")]
    PaymentRequired,

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::PaymentRequired => (
                StatusCode::PAYMENT_REQUIRED,
                "payment_required",
                Some("An active trial or subscription is required".to_string()),
            ),
            AppError::Ai(err) => {
                tracing::warn!(kind = err.kind.as_str(), error = %err.message, "AI request failed");
                let status = if err.kind == AiErrorKind::QuotaExceeded {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, "ai_error", Some(err.kind.user_message().to_string()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

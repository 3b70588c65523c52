use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;

use crate::entities::RideStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("ride not found")]
    NotFound,

    #[error("ride has already been claimed")]
    Conflict,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: RideStatus, to: RideStatus },

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("environment variable error")]
    EnvVar(#[from] env::VarError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("authorization policy error")]
    Authorization(#[from] oso::OsoError),

    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Stable numeric code included in every error body. Codes below 100 are
    /// internal and never expose their message.
    pub fn code(&self) -> i32 {
        match self {
            Self::EnvVar(_) => 1,
            Self::Database(_) => 2,
            Self::Authorization(_) => 3,
            Self::Config(_) => 4,
            Self::Server(_) => 5,
            Self::Validation(_) => 100,
            Self::NotFound => 101,
            Self::Conflict => 102,
            Self::Forbidden => 103,
            Self::InvalidTransition { .. } => 104,
            Self::Unauthenticated => 105,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = self.status();

        let error_message = match code {
            1..=99 => {
                tracing::error!(code, error = ?self, "internal error");
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "code": code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

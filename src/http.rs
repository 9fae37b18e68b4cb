use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::{runner::CommandError, signature};

/// The response only ever carries the status' canonical reason; the error
/// itself is for the log.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("method {0} is not allowed")]
    MethodNotAllowed(actix_web::http::Method),
    #[error("github event `{0}` is not supported")]
    UnsupportedEvent(String),
    #[error("only JSON payloads are supported, got content type `{0}`")]
    NotJson(String),
    #[error("no hook is configured for `{0}`")]
    UnknownTarget(String),
    #[error("failed reading request body: {0}")]
    Body(#[from] actix_web::error::PayloadError),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] signature::Error),
    #[error("hook command failed: {0}")]
    Command(#[from] CommandError),
}

impl ResponseError for HookError {
    fn status_code(&self) -> StatusCode {
        match self {
            HookError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HookError::UnsupportedEvent(_) => StatusCode::BAD_REQUEST,
            HookError::NotJson(_) => StatusCode::NOT_ACCEPTABLE,
            HookError::UnknownTarget(_) => StatusCode::NOT_FOUND,
            HookError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HookError::Body(_)
            | HookError::Json(_)
            | HookError::Command(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(status.canonical_reason().unwrap_or_default())
    }
}

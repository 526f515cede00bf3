use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wayfare_core::payment::PaymentError;
use wayfare_core::CoreError;
use wayfare_order::{Redirect, SessionError};

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    SourceUnavailable(String),
    PaymentInProgress(String),
    Redirect(Redirect),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::SourceUnavailable(msg) => {
                tracing::warn!("Catalog unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::PaymentInProgress(msg) => (StatusCode::CONFLICT, msg),
            AppError::Redirect(redirect) => {
                let location = redirect.location();
                tracing::debug!("Redirecting to {}: {}", location, redirect.reason);
                let body = Json(json!({
                    "error": redirect.reason,
                    "redirect": location,
                }));
                return (StatusCode::SEE_OTHER, [(header::LOCATION, location)], body).into_response();
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::Validation(msg),
            CoreError::NotFound(msg) => AppError::NotFound(msg),
            CoreError::SourceUnavailable(msg) => AppError::SourceUnavailable(msg),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::Redirect(redirect) => AppError::Redirect(redirect),
            SessionError::PaymentInProgress => AppError::PaymentInProgress(message),
            SessionError::Core(inner) => inner.into(),
        }
    }
}

impl From<Redirect> for AppError {
    fn from(redirect: Redirect) -> Self {
        AppError::Redirect(redirect)
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

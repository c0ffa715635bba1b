use crate::config::ConfigError;
use crate::cra::{BatchError, ConfigStoreError, CraServiceError, InputError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    BadInput(String),
    ConfigStore(ConfigStoreError),
    Batch(BatchError),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadInput(_) => StatusCode::BAD_REQUEST,
            AppError::Batch(err) if err.is_bad_input() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadInput(message) | AppError::Internal(message) => message.clone(),
            AppError::Config(err) => err.to_string(),
            AppError::Telemetry(err) => err.to_string(),
            AppError::Io(err) => err.to_string(),
            AppError::Server(err) => err.to_string(),
            AppError::ConfigStore(err) => err.to_string(),
            AppError::Batch(err) => err.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::BadInput(message) => write!(f, "bad input: {}", message),
            AppError::ConfigStore(err) => write!(f, "config store error: {}", err),
            AppError::Batch(err) => write!(f, "batch error: {}", err),
            AppError::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::ConfigStore(err) => Some(err),
            AppError::Batch(err) => Some(err),
            AppError::BadInput(_) | AppError::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status == StatusCode::BAD_REQUEST {
            "Bad request"
        } else {
            "Internal server error"
        };

        let body = Json(json!({ "error": error, "message": self.message() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ConfigStoreError> for AppError {
    fn from(value: ConfigStoreError) -> Self {
        Self::ConfigStore(value)
    }
}

impl From<BatchError> for AppError {
    fn from(value: BatchError) -> Self {
        Self::Batch(value)
    }
}

impl From<InputError> for AppError {
    fn from(value: InputError) -> Self {
        Self::BadInput(value.to_string())
    }
}

impl From<CraServiceError> for AppError {
    fn from(value: CraServiceError) -> Self {
        match value {
            CraServiceError::Store(err) => Self::ConfigStore(err),
            CraServiceError::Batch(err) => Self::Batch(err),
        }
    }
}

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Error shape handed to the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidOperation(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidOperation(_) => "invalid_operation",
            _ => "internal_error",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let field = match self {
            AppError::Validation { field, .. } => Some(*field),
            _ => None,
        };
        let message = match self {
            AppError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ErrorBody {
            code: self.code(),
            message,
            field,
        }
    }
}

// Domain errors raised inside a store closure come back wrapped in
// `tokio_rusqlite::Error::Other`.
impl From<tokio_rusqlite::Error> for AppError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => AppError::Database(e),
            tokio_rusqlite::Error::Other(inner) => match inner.downcast::<AppError>() {
                Ok(app) => *app,
                Err(other) => AppError::Store(other.to_string()),
            },
            other => AppError::Store(other.to_string()),
        }
    }
}

impl From<AppError> for tokio_rusqlite::Error {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(e) => tokio_rusqlite::Error::Rusqlite(e),
            other => tokio_rusqlite::Error::Other(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_names_field() {
        let body = AppError::validation("content", "Content is required for text posts.").body();
        assert_eq!(body.code, "validation_error");
        assert_eq!(body.field, Some("content"));
        assert_eq!(body.message, "Content is required for text posts.");
    }

    #[test]
    fn domain_error_survives_store_boundary() {
        let wrapped: tokio_rusqlite::Error = AppError::not_found("post 7").into();
        let back: AppError = wrapped.into();
        assert!(matches!(back, AppError::NotFound(ref what) if what == "post 7"));
        assert_eq!(back.code(), "not_found");
    }
}

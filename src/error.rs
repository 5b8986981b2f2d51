use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected upstream response: {0}")]
    UpstreamShape(String),

    #[error("unknown day: {0}")]
    UnknownDay(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                AppError::UniquenessViolation(msg.unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("no matching row".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error> for AppError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => e.into(),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::UpstreamShape(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("invalid url: {}", err))
    }
}

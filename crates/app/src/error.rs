use engine::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl AppError {
    /// Message shown to the user. Storage details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Engine(err) => err.user_message(),
            AppError::Database(_) => "database unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

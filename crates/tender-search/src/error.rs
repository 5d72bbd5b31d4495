#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("feed '{id}' unavailable: {message}")]
    Feed { id: String, message: String },
}

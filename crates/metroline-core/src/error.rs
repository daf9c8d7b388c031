pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid range boundary `{value}` (expected date format `{format}`)")]
    InvalidRangeBoundary { value: String, format: String },

    #[error("Invalid dataset: {message}")]
    InvalidDataset { message: String },

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Dataset JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

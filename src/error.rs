use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvoVisionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvoVisionError>;

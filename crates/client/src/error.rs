use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("No conversation selected")]
    NotSelected,

    #[error("Configuration error: {0}")]
    Config(String),
}

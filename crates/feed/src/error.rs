use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;

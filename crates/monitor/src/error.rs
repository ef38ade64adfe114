use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("table error: {0}")]
    Table(#[from] stockwatch_table::TableError),

    #[error("feed error: {0}")]
    Feed(#[from] stockwatch_feed::FeedError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("empty condition")]
    Empty,

    #[error("lex error at byte {pos}: {message}")]
    Lex { pos: usize, message: String },

    #[error("parse error at byte {pos}: {message}")]
    Parse { pos: usize, message: String },
}

pub type Result<T> = std::result::Result<T, ConditionError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("project \"{0}\" already exists")]
    DuplicateName(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),
    #[error("work interval {0} no longer exists")]
    UnknownWork(i64),
}

use thiserror::Error;

use crate::storage::error::StoreError;

/// Errors that end a tracker command. Storage failures are passed through untouched.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("You're not doing anything right now!")]
    NoActiveSession,
    #[error("No project? Name one, or finish some work first so there is one to continue.")]
    ProjectResolutionFailed,
    #[error("No project? Name the project to drop.")]
    MissingProjectName,
    #[error("No project named \"{0}\".")]
    ProjectNotFound(String),
    #[error("{0}")]
    InvalidLogArguments(String),
    #[error("A project named \"{0}\" already exists.")]
    DuplicateProjectName(String),
    #[error(transparent)]
    Store(StoreError),
}

impl TrackerError {
    pub fn invalid_log(reason: impl Into<String>) -> Self {
        Self::InvalidLogArguments(reason.into())
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateName(name) => Self::DuplicateProjectName(name),
            other => Self::Store(other),
        }
    }
}

use thiserror::Error;

use super::ProcessId;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process {0} not found")]
    NotFound(ProcessId),
    #[error("process {0} is still booting")]
    NotReady(ProcessId),
    #[error("unknown contract '{0}'")]
    UnknownContract(String),
    #[error("action '{0}' mutates state and cannot be dry-run")]
    ReadOnly(String),
    #[error("process {0} stopped")]
    Stopped(ProcessId),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// Validation failure for an incoming command, reported back to the sender
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Month and Page are required")]
    MissingFields,
    #[error("Unknown month '{0}'")]
    UnknownMonth(String),
}

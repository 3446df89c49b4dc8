//! Error taxonomy shared by the service layer.

use thiserror::Error;

use crate::dao::storage::StorageError;
use crate::state::session::ContractViolation;

/// Errors that can occur while processing one inbound event.
///
/// These never escape the dispatch boundary: `services::flow` converts them
/// into a generic-failure prompt plus a session clear, so one chat's failure
/// cannot affect another chat.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The archive could not be read or written.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Session fields contradict the stage the session claims to be in.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ContractViolation> for ServiceError {
    fn from(err: ContractViolation) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

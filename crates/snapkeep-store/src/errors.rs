//! Error handling for snapkeep-store
//!
//! Wraps snapkeep-core ExError with store-specific helpers

use snapkeep_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an error for a collaborator call that could not be started
pub fn spawn_error(operation: &str, program: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Collaborator)
        .with_op(operation)
        .with_message(format!("failed to run {}: {}", program, err))
}

/// Create an error for a collaborator call that exited unsuccessfully
pub fn command_failed(operation: &str, command: &str, stderr: &str) -> ExError {
    let detail = stderr.trim();
    let message = if detail.is_empty() {
        format!("'{}' failed", command)
    } else {
        format!("'{}' failed: {}", command, detail)
    };
    ExError::new(ExErrorKind::Collaborator)
        .with_op(operation)
        .with_message(message)
}

/// Create an error for a dataset the store does not know
pub fn dataset_missing(operation: &str, dataset: &str) -> ExError {
    ExError::new(ExErrorKind::DatasetMissing)
        .with_op(operation)
        .with_dataset(dataset)
        .with_message(format!("dataset '{}' does not exist", dataset))
}

/// Create an error for an incremental base missing on either side
pub fn base_missing(base: &str, target_dataset: &str) -> ExError {
    ExError::new(ExErrorKind::Collaborator)
        .with_op("transfer")
        .with_target(target_dataset)
        .with_snapshot(base)
        .with_message(format!("incremental base '{}' is not on both sides", base))
}

/// Create an error for a forced failure in the memory store
pub fn injected_failure(operation: &str, subject: &str) -> ExError {
    ExError::new(ExErrorKind::Collaborator)
        .with_op(operation)
        .with_message(format!("injected failure for '{}'", subject))
}

/// Create an error for a pipe that could not be read
pub fn pipe_error(operation: &str, command: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation)
        .with_message(format!("reading stderr of '{}' failed: {}", command, err))
}

/// Create an error for poisoned in-process state
pub fn state_poisoned(operation: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(operation)
        .with_message("store state lock poisoned")
}

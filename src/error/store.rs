use thiserror::Error;

use super::AppError;
use crate::model::RecordId;

pub const STORE_OPEN_FAILED: &str = "STORE/OPEN_FAILED";
pub const STORE_STORAGE: &str = "STORE/STORAGE";
pub const STORE_NOT_FOUND: &str = "STORE/NOT_FOUND";
pub const STORE_NOT_READY: &str = "STORE/NOT_READY";

/// Failures raised by the record store.
///
/// `Open` is fatal to the session: nothing is served until a reopen
/// succeeds. `Storage` and `NotFound` are local to the call that hit them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store could not be opened: {message}")]
    Open { message: String },
    #[error("{operation} on `{container}` failed: {source}")]
    Storage {
        container: &'static str,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("no `{container}` record with id {id}")]
    NotFound { container: &'static str, id: RecordId },
}

impl StoreError {
    pub fn open(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Open {
            message: format!("{:#}", err.into()),
        }
    }

    pub fn storage(container: &'static str, operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StoreError::Storage {
            container,
            operation,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Open { message } => {
                AppError::new(STORE_OPEN_FAILED, "The record store could not be opened.")
                    .with_context("reason", message)
            }
            StoreError::Storage {
                container,
                operation,
                source,
            } => AppError::new(STORE_STORAGE, "Saving or loading your data failed.")
                .with_context("container", container)
                .with_context("operation", operation)
                .with_cause(source),
            StoreError::NotFound { container, id } => {
                AppError::new(STORE_NOT_FOUND, "That record no longer exists.")
                    .with_context("container", container)
                    .with_context("id", id.to_string())
            }
        }
    }
}

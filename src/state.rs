use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::error::store::STORE_NOT_READY;
use crate::store::RecordStore;
use crate::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Opening,
    Ready,
    Failed,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Opening,
    Ready(RecordStore),
    Failed(AppError),
}

/// Session state shared by every command.
///
/// Owns the store handle; commands borrow a clone of it and get
/// `STORE/NOT_READY` until an open has succeeded.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    slot: Arc<RwLock<Slot>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: RecordStore) -> Self {
        AppState {
            slot: Arc::new(RwLock::new(Slot::Ready(store))),
        }
    }

    /// Open the database named by `config`. A failed open is recorded in
    /// the returned state rather than returned as an error.
    pub async fn open(config: &Config) -> Self {
        let state = Self::new();
        state.reopen(config.db_path()).await;
        state
    }

    pub async fn open_in_memory() -> Self {
        let state = Self::new();
        let result = RecordStore::open_in_memory().await;
        state.settle(result);
        state
    }

    pub async fn reopen(&self, db_path: &Path) -> StoreStatus {
        let previous = std::mem::take(&mut *self.slot.write().unwrap_or_else(|e| e.into_inner()));
        if let Slot::Ready(store) = previous {
            store.close().await;
        }
        let result = RecordStore::open(db_path).await;
        self.settle(result)
    }

    fn settle(&self, result: Result<RecordStore, crate::StoreError>) -> StoreStatus {
        let (slot, status) = match result {
            Ok(store) => (Slot::Ready(store), StoreStatus::Ready),
            Err(err) => {
                let app = AppError::from(err);
                app.log_with_event("store_open_failed");
                (Slot::Failed(app), StoreStatus::Failed)
            }
        };
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = slot;
        status
    }

    pub fn status(&self) -> StoreStatus {
        match &*self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Opening => StoreStatus::Opening,
            Slot::Ready(_) => StoreStatus::Ready,
            Slot::Failed(_) => StoreStatus::Failed,
        }
    }

    pub fn open_error(&self) -> Option<AppError> {
        match &*self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn store(&self) -> AppResult<RecordStore> {
        match &*self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Ready(store) => Ok(store.clone()),
            Slot::Opening => Err(not_ready()),
            Slot::Failed(err) => Err(not_ready().with_cause(err.clone())),
        }
    }

    /// Close the store; the state reports `Opening` until the next reopen.
    pub async fn close(&self) {
        let previous = std::mem::take(&mut *self.slot.write().unwrap_or_else(|e| e.into_inner()));
        if let Slot::Ready(store) = previous {
            store.close().await;
        }
    }
}

fn not_ready() -> AppError {
    AppError::new(STORE_NOT_READY, "The record store is not ready yet.")
}

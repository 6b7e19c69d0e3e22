#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fitpro_lib::db::DB_FILE_NAME;
use fitpro_lib::{AppState, RecordStore};
use tempfile::TempDir;
use tracing::subscriber::{self, DefaultGuard};
use tracing_subscriber::{fmt, EnvFilter};

pub async fn memory_store() -> RecordStore {
    RecordStore::open_in_memory()
        .await
        .expect("open in-memory store")
}

pub async fn memory_state() -> AppState {
    AppState::with_store(memory_store().await)
}

pub fn temp_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(DB_FILE_NAME);
    (dir, path)
}

pub async fn file_store(path: &Path) -> RecordStore {
    RecordStore::open(path).await.expect("open file store")
}

pub struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// JSON subscriber for the current thread, writing into a shared buffer.
pub fn capture_logs() -> (Arc<Mutex<Vec<u8>>>, DefaultGuard) {
    let buffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let writer = buffer.clone();
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("fitpro=debug"))
        .with_writer(move || BufferWriter(writer.clone()))
        .json()
        .finish();
    let guard = subscriber::set_default(subscriber);
    (buffer, guard)
}

pub fn logs_to_string(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(buffer.lock().unwrap().clone()).expect("log utf8")
}

//! Wraps a flaky in-memory backend with retry and a circuit breaker.
//!
//! Run with `cargo run --example resilient_storage`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storage_rail::prelude::*;
use storage_rail::ByteReader;

/// Fails every third call with a retryable error.
#[derive(Default)]
struct FlakyMemory {
    files: Mutex<HashMap<String, Vec<u8>>>,
    calls: AtomicU32,
}

impl FlakyMemory {
    fn tick(&self, op: Operation, path: &str) -> Result<(), StorageError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n % 3 == 0 {
            return Err(BackendError::transient(op, path, "simulated timeout").into());
        }
        Ok(())
    }
}

impl Storage for FlakyMemory {
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.tick(Operation::Read, path)?;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::not_found(Operation::Read, path).into())
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.tick(Operation::Write, path)?;
        self.files.lock().unwrap().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.tick(Operation::Delete, path)?;
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.tick(Operation::List, prefix)?;
        Ok(self.files.lock().unwrap().keys().filter(|p| p.starts_with(prefix)).cloned().collect())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.tick(Operation::Exists, path)?;
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    async fn stat(&self, path: &str) -> Result<FileInfo, StorageError> {
        let data = self.read(path).await?;
        Ok(FileInfo::file(path, data.len() as u64))
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let data = self.read(src).await?;
        self.files.lock().unwrap().insert(dst.to_string(), data);
        Ok(())
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.copy(src, dst).await?;
        self.files.lock().unwrap().remove(src);
        Ok(())
    }

    async fn health(&self) -> Result<(), StorageError> {
        self.tick(Operation::Health, "")
    }

    async fn read_stream(&self, path: &str) -> Result<ByteReader, StorageError> {
        let data = self.read(path).await?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn write_stream(&self, path: &str, _reader: ByteReader) -> Result<u64, StorageError> {
        Err(BackendError::permanent(Operation::WriteStream, path, "read-only demo stream").into())
    }

    fn kind(&self) -> &'static str {
        "flaky-memory"
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), StorageError> {
    let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(5)));
    let retry = RetryConfig::new(
        4,
        ExponentialBackoff::new(Duration::from_millis(20), Duration::from_millis(500)),
    );
    let storage = ResilientStorage::new(FlakyMemory::default(), retry).with_breaker(breaker.clone());

    storage.write("notes/today.md", b"# Today\n- ship the retry layer\n").await?;
    let note = storage.read("notes/today.md").await?;
    println!("read {} bytes from {}", note.len(), storage.kind());
    println!("listing: {:?}", storage.list("notes/").await?);

    match storage.read("notes/missing.md").await {
        Err(err) if err.is_not_found() => println!("not found, no retries: {err}"),
        other => println!("unexpected: {other:?}"),
    }

    println!("breaker state: {:?}, failures: {}", breaker.state(), breaker.failure_count());
    storage.close().await
}

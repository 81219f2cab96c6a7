//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use storage_rail::{BackendError, ByteReader, FileInfo, Operation, Storage, StorageError};
use tokio::io::AsyncReadExt;

/// In-memory backend that fails on demand.
///
/// Scripted failures are consumed one per call, across all capabilities.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    script: Mutex<VecDeque<bool>>,
    always: Mutex<Option<bool>>,
    calls: AtomicU32,
    closed: AtomicU32,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        self.files.lock().unwrap().insert(path.to_string(), data.to_vec());
        self
    }

    /// Makes the next `times` calls fail.
    pub fn fail_next(&self, times: usize, retryable: bool) {
        self.script.lock().unwrap().extend(std::iter::repeat(retryable).take(times));
    }

    /// Makes every call fail until [`heal`](Self::heal) is called.
    pub fn fail_always(&self, retryable: bool) {
        *self.always.lock().unwrap() = Some(retryable);
    }

    pub fn heal(&self) {
        *self.always.lock().unwrap() = None;
        self.script.lock().unwrap().clear();
    }

    /// Number of capability calls that reached the backend.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> u32 {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn enter(&self, op: Operation, path: &str) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted.or(*self.always.lock().unwrap()) {
            Some(retryable) => {
                Err(BackendError::new(op, path, "injected failure", retryable).into())
            },
            None => Ok(()),
        }
    }

    fn get(&self, op: Operation, path: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::not_found(op, path).into())
    }
}

impl Storage for FlakyStorage {
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.enter(Operation::Read, path)?;
        self.get(Operation::Read, path)
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.enter(Operation::Write, path)?;
        self.files.lock().unwrap().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.enter(Operation::Delete, path)?;
        match self.files.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(BackendError::not_found(Operation::Delete, path).into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.enter(Operation::List, prefix)?;
        let mut paths: Vec<String> =
            self.files.lock().unwrap().keys().filter(|p| p.starts_with(prefix)).cloned().collect();
        paths.sort();
        Ok(paths)
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.enter(Operation::Exists, path)?;
        Ok(self.contains(path))
    }

    async fn stat(&self, path: &str) -> Result<FileInfo, StorageError> {
        self.enter(Operation::Stat, path)?;
        let data = self.get(Operation::Stat, path)?;
        Ok(FileInfo::file(path, data.len() as u64))
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.enter(Operation::Copy, src)?;
        let data = self.get(Operation::Copy, src)?;
        self.files.lock().unwrap().insert(dst.to_string(), data);
        Ok(())
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.enter(Operation::Move, src)?;
        let mut files = self.files.lock().unwrap();
        let data = files.remove(src).ok_or_else(|| BackendError::not_found(Operation::Move, src))?;
        files.insert(dst.to_string(), data);
        Ok(())
    }

    async fn health(&self) -> Result<(), StorageError> {
        self.enter(Operation::Health, "")
    }

    async fn read_stream(&self, path: &str) -> Result<ByteReader, StorageError> {
        self.enter(Operation::ReadStream, path)?;
        let data = self.get(Operation::ReadStream, path)?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn write_stream(&self, path: &str, mut reader: ByteReader) -> Result<u64, StorageError> {
        self.enter(Operation::WriteStream, path)?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| BackendError::permanent(Operation::WriteStream, path, e))?;
        let written = data.len() as u64;
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(written)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//! Per-image reader/writer lock.
//!
//! States are `Free`, `ReadLocked(n)` and `WriteLocked`. Guards
//! release on drop (or through `unlock`). There is no upgrade
//! from read to write and the write lock is not re-entrant.
//!
//! The lock is cooperative: it coordinates components sharing an
//! image, and structural operations (`free_image`, `swap`) refuse
//! to run while any guard is alive. Guards do not borrow the
//! image, so they may be held across calls.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{ImageError, Result};

#[derive(Debug, Default)]
struct Counters {
    readers : usize,
    writer : bool,
}

/// Observable state of a `LockState`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockStatus {
    Free,
    ReadLocked(usize),
    WriteLocked,
}

#[derive(Debug, Default)]
pub struct LockState {
    counters : Arc<Mutex<Counters>>,
}

impl LockState {
    pub fn new() -> LockState {
        LockState::default()
    }

    pub fn status(&self) -> LockStatus {
        let counters = self.counters.lock();
        match (counters.writer, counters.readers) {
            (true, _) => LockStatus::WriteLocked,
            (false, 0) => LockStatus::Free,
            (false, n) => LockStatus::ReadLocked(n),
        }
    }

    /// True when no write lock is held.
    pub fn can_read_lock(&self) -> bool {
        !self.counters.lock().writer
    }

    /// True only when no lock at all is held.
    pub fn can_write_lock(&self) -> bool {
        let counters = self.counters.lock();
        !counters.writer && counters.readers == 0
    }

    /// Adds a reader. Fails with `Locked` while the write lock is held.
    pub fn read_lock(&self) -> Result<ReadLock> {
        let mut counters = self.counters.lock();
        if counters.writer {
            log::warn!("Read lock refused: image is write-locked");
            return Err(ImageError::Locked);
        }
        counters.readers += 1;
        Ok(ReadLock { counters : Some(Arc::clone(&self.counters)) })
    }

    /// Takes the write lock. Fails with `Locked` unless the lock is `Free`.
    pub fn write_lock(&self) -> Result<WriteLock> {
        let mut counters = self.counters.lock();
        if counters.writer || counters.readers > 0 {
            log::warn!("Write lock refused: image is locked");
            return Err(ImageError::Locked);
        }
        counters.writer = true;
        Ok(WriteLock { counters : Some(Arc::clone(&self.counters)) })
    }
}

/// Shared access token. Dropping it (or calling `unlock`) releases it.
#[must_use = "the read lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ReadLock {
    counters : Option<Arc<Mutex<Counters>>>,
}

impl ReadLock {
    pub fn unlock(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(counters) = self.counters.take() {
            let mut counters = counters.lock();
            counters.readers = counters.readers.saturating_sub(1);
        }
    }
}

impl Drop for ReadLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Exclusive access token. Dropping it (or calling `unlock`) releases it.
#[must_use = "the write lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct WriteLock {
    counters : Option<Arc<Mutex<Counters>>>,
}

impl WriteLock {
    pub fn unlock(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(counters) = self.counters.take() {
            counters.lock().writer = false;
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        self.release();
    }
}

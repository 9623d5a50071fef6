//! Open/close locking around symbols.
//!
//! The codec, index, stream and cursor components are single-threaded
//! and carry no locking of their own. Concurrency lives entirely at
//! this boundary: opening a symbol for read or write takes a per-symbol
//! in-process lock (one writer or many readers) plus an advisory
//! cross-process lock file, and both release on drop. Inside that
//! critical section all access is effectively single-threaded.
//!
//! The file lock is deliberately lenient: acquisition is a bounded
//! spin-wait, and exceeding the bound proceeds without the lock with a
//! warning rather than failing the operation.

use crate::error::Result;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{Mutex, RawRwLock, RwLock};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Holds a symbol open for reading. Other readers may coexist; a writer
/// waits until every read guard drops.
pub struct SymbolReadGuard {
    _guard: ArcRwLockReadGuard<RawRwLock, ()>,
}

/// Holds a symbol open for writing, excluding all other access until
/// dropped.
pub struct SymbolWriteGuard {
    _guard: ArcRwLockWriteGuard<RawRwLock, ()>,
}

/// In-process registry of per-symbol reader/writer locks.
///
/// Lock entries are created on first use and kept for the registry's
/// lifetime; the registry is shared behind an `Arc` by everything that
/// opens symbols in the process.
#[derive(Default)]
pub struct SymbolLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl SymbolLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, symbol: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock();
        match locks.get(symbol) {
            Some(lock) => Arc::clone(lock),
            None => {
                let lock = Arc::new(RwLock::new(()));
                locks.insert(symbol.to_owned(), Arc::clone(&lock));
                lock
            }
        }
    }

    /// Opens `symbol` for reading, blocking while a writer holds it.
    pub fn open_read(&self, symbol: &str) -> SymbolReadGuard {
        SymbolReadGuard {
            _guard: self.handle(symbol).read_arc(),
        }
    }

    /// Opens `symbol` for writing, blocking while any other guard holds
    /// it.
    pub fn open_write(&self, symbol: &str) -> SymbolWriteGuard {
        SymbolWriteGuard {
            _guard: self.handle(symbol).write_arc(),
        }
    }
}

/// Spin-wait tunables for [`FileLock::acquire`].
#[derive(Debug, Clone)]
pub struct FileLockConfig {
    /// Attempts before giving up and proceeding without the lock.
    pub max_spins: usize,
    /// Pause between attempts.
    pub spin_pause: Duration,
}

impl Default for FileLockConfig {
    fn default() -> Self {
        Self {
            max_spins: 100,
            spin_pause: Duration::from_millis(10),
        }
    }
}

impl FileLockConfig {
    /// Sets the number of acquisition attempts.
    pub fn with_max_spins(mut self, max_spins: usize) -> Self {
        self.max_spins = max_spins;
        self
    }

    /// Sets the pause between attempts.
    pub fn with_spin_pause(mut self, spin_pause: Duration) -> Self {
        self.spin_pause = spin_pause;
        self
    }
}

/// Advisory cross-process lock backed by a lock file.
///
/// Acquisition creates the file exclusively and spins while another
/// process holds it. The spin is bounded; exhausting it is not an error
/// but a logged fallback where the operation continues unlocked. The
/// file is removed on drop.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    held: bool,
}

impl FileLock {
    /// Acquires the lock file at `path`, spinning per `config` while it
    /// already exists.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only for failures other than the file
    /// already existing (permissions, missing directory).
    pub fn acquire(path: impl Into<PathBuf>, config: &FileLockConfig) -> Result<Self> {
        let path = path.into();
        let mut attempts = 0;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!(path = %path.display(), attempts, "acquired file lock");
                    return Ok(Self { path, held: true });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempts += 1;
                    if attempts >= config.max_spins {
                        warn!(
                            path = %path.display(),
                            attempts,
                            "file lock spin-wait exhausted, proceeding without lock"
                        );
                        return Ok(Self { path, held: false });
                    }
                    thread::sleep(config.spin_pause);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// True if the lock file was actually created by this guard.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
            }
        }
    }
}

use crate::{ControlChannel, LifecycleError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

/// Name of the lock file kept in the host home directory.
pub const LOCK_FILE: &str = "switchyard.lock";

/// Exclusive advisory lock on a host home directory. Released on drop.
pub struct HomeLock {
    lock_file: File,
    path: PathBuf,
}

impl HomeLock {
    /// Block until the lock on `<home>/switchyard.lock` is held.
    pub fn acquire(home: &Path) -> Result<Self, LifecycleError> {
        let (file, path) = open_lock_file(home)?;
        file.lock_exclusive()?;
        Ok(Self {
            lock_file: file,
            path,
        })
    }

    /// `Ok(None)` when another process already holds the lock.
    pub fn try_acquire(home: &Path) -> Result<Option<Self>, LifecycleError> {
        let (file, path) = open_lock_file(home)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                lock_file: file,
                path,
            })),
            Err(_) => Ok(None),
        }
    }

    /// Like [`try_acquire`](Self::try_acquire), but a held lock is an error.
    pub fn acquire_or_fail(home: &Path) -> Result<Self, LifecycleError> {
        Self::try_acquire(home)?
            .ok_or_else(|| LifecycleError::Lock(home.display().to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(home: &Path) -> Result<(File, PathBuf), LifecycleError> {
    std::fs::create_dir_all(home)?;
    let path = home.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)?;
    Ok((file, path))
}

impl Drop for HomeLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Route SIGINT/SIGTERM into the control channel's terminate signal. A second
/// signal exits the process immediately.
pub fn install_signal_handler(channel: Arc<ControlChannel>) {
    let result = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        eprintln!("\nshutdown requested, stopping control channel...");
        if let Err(e) = channel.send_shutdown_signal() {
            error!("failed to send shutdown signal: {e}");
            // Still release anyone waiting on the latch.
            let tag = channel.latch().terminate_tag().to_owned();
            channel.latch().signal(&tag);
        }
    });
    if let Err(e) = result {
        warn!("failed to install signal handler: {e}");
    }
}

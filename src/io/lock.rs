//! Lock file for single-instance enforcement.
//!
//! The daemon and the one-shot `open`/`close` commands both drive the stepper
//! and rewrite the door record, so only one of them may run at a time. The
//! lock lives in `$XDG_RUNTIME_DIR` and holds the owner's PID.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;
use crate::common::utils::{self, private_path};

/// Held lock; released and removed on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

pub fn lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Acquire the instance lock at the default location.
pub fn acquire_lock() -> Result<InstanceLock> {
    acquire_lock_at(&lock_path())
}

/// Acquire the lock at `path`, clearing it first if its owner is gone.
pub fn acquire_lock_at(path: &Path) -> Result<InstanceLock> {
    if let Some(lock) = try_lock(path)? {
        return Ok(lock);
    }

    handle_lock_conflict(path)?;

    try_lock(path)?.with_context(|| {
        format!(
            "Failed to acquire {} after removing a stale lock",
            private_path(path)
        )
    })
}

/// PID recorded in the lock file at `path`, if the lock is currently held.
pub fn running_instance(path: &Path) -> Option<u32> {
    let pid = read_pid(path)?;
    utils::is_process_running(pid).then_some(pid)
}

fn try_lock(path: &Path) -> Result<Option<InstanceLock>> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", private_path(path)))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(InstanceLock {
        file,
        path: path.to_path_buf(),
    }))
}

/// Remove a stale lock, or fail if its owner is still alive.
fn handle_lock_conflict(path: &Path) -> Result<()> {
    match read_pid(path) {
        None => {
            log_warning!("Lock file content invalid, removing");
        }
        Some(pid) if !utils::is_process_running(pid) => {
            log_warning!("Removing stale lock file (process {pid} no longer running)");
        }
        Some(pid) => {
            anyhow::bail!(
                "coopbot is already running (PID: {pid}); stop it before starting another instance"
            );
        }
    }

    let _ = std::fs::remove_file(path);
    Ok(())
}

fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_records_pid_and_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coopbot.lock");

        let lock = acquire_lock_at(&path).unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id()));
        assert_eq!(running_instance(&path), Some(std::process::id()));

        drop(lock);
        assert!(!path.exists());
        assert_eq!(running_instance(&path), None);
    }

    #[test]
    fn test_second_lock_is_refused_while_owner_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coopbot.lock");

        let _held = acquire_lock_at(&path).unwrap();
        let err = acquire_lock_at(&path).unwrap_err().to_string();
        assert!(err.contains("already running"), "unexpected error: {err}");
    }

    #[test]
    fn test_unlocked_leftover_file_is_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coopbot.lock");
        std::fs::write(&path, "4194303\n").unwrap();

        let _lock = acquire_lock_at(&path).unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id()));
    }
}

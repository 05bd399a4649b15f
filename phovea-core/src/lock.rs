use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use fs_err as fs;

const ATTEMPTS: u32 = 50;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// `mapping.json` is guarded by `mapping.json.lock`.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Exclusive write access to a shared file, released on drop.
///
/// Other processes serving the same data directory use the same lock file,
/// so concurrent id allocations do not overwrite each other.
pub struct FileLock(PathBuf);

impl FileLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(path);

        for attempt in 0..ATTEMPTS {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path);
            match created {
                Ok(_) => return Ok(Self(lock_path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
            if attempt == 0 {
                log::debug!("Waiting for {}", lock_path.display());
            }
            thread::sleep(RETRY_DELAY);
        }

        bail!("Timeout acquiring lock for {}", path.display())
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_target() {
        let target = Path::new("/srv/data/mapping.json");
        assert_eq!(lock_path_for(target), Path::new("/srv/data/mapping.json.lock"));
    }

    #[test]
    fn lock_file_removed_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("mapping.json");
        let lock_path = lock_path_for(&target);
        {
            let _lock = FileLock::acquire(&target).unwrap();
            assert!(lock_path.exists());
        }
        assert!(!lock_path.exists());
        assert!(FileLock::acquire(&target).is_ok());
    }

    #[test]
    fn missing_directory_fails_without_waiting() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("absent").join("mapping.json");
        let err = FileLock::acquire(&target).err().unwrap();
        assert!(!err.to_string().contains("Timeout"));
    }
}

//! Preparing `<root>/<YYYY-MM-DD>` before any image is written.
use crate::date_resolver::DATE_FORMAT;
use crate::error::AcquisitionError;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory exists, has a write permission bit, and this process may write to it.
pub fn is_writable_dir(path: &Path) -> bool {
    let is_dir_with_write_bit = fs::metadata(path)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false);
    is_dir_with_write_bit && process_can_write(path)
}

/// access(2) with `W_OK`: honours ownership, the process's uid/gid and read-only mounts.
#[cfg(unix)]
fn process_can_write(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let r = unsafe { libc::access(c_path.as_ptr(), libc::W_OK) };
    if r != 0 {
        debug!(path = %path.display(), error = %io::Error::last_os_error(), "access(W_OK) refused");
    }
    r == 0
}

#[cfg(not(unix))]
fn process_can_write(_path: &Path) -> bool {
    true
}

/// Return the per-day subfolder of `root`, creating it when missing.
///
/// An existing subfolder is only reused when `confirm_overwrite` agrees; its
/// contents are kept and same-named files are replaced as images are saved.
pub fn stage(
    root: &Path,
    date: NaiveDate,
    confirm_overwrite: impl FnOnce() -> bool,
) -> Result<PathBuf, AcquisitionError> {
    if !is_writable_dir(root) {
        return Err(AcquisitionError::RootNotWritable(root.to_path_buf()));
    }

    let subfolder = root.join(date.format(DATE_FORMAT).to_string());

    if subfolder.is_dir() {
        debug!(path = %subfolder.display(), "subfolder already exists");
        if !confirm_overwrite() {
            return Err(AcquisitionError::AbortedByUser(subfolder));
        }
        info!(path = %subfolder.display(), "overwriting in place");
        return Ok(subfolder);
    }

    create_dir(&subfolder).map_err(|source| AcquisitionError::DirectoryCreateFailed {
        path: subfolder.clone(),
        source,
    })?;
    info!(path = %subfolder.display(), "created subfolder");
    Ok(subfolder)
}

fn create_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 11, 20).unwrap()
    }

    #[test]
    fn test_creates_missing_subfolder() {
        let root = TempDir::new().unwrap();
        let asked = Cell::new(false);
        let path = stage(root.path(), day(), || {
            asked.set(true);
            true
        })
        .unwrap();

        assert_eq!(path, root.path().join("2022-11-20"));
        assert!(path.is_dir());
        assert!(!asked.get());
    }

    #[cfg(unix)]
    #[test]
    fn test_created_subfolder_mode() {
        use std::os::unix::fs::PermissionsExt;
        let root = TempDir::new().unwrap();
        let path = stage(root.path(), day(), || true).unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !0o755, 0);
        assert_eq!(mode & 0o700, 0o700);
    }

    #[test]
    fn test_existing_subfolder_confirmed() {
        let root = TempDir::new().unwrap();
        let existing = root.path().join("2022-11-20");
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("keep.png"), b"old").unwrap();

        let path = stage(root.path(), day(), || true).unwrap();
        assert_eq!(path, existing);
        assert_eq!(fs::read(existing.join("keep.png")).unwrap(), b"old");
    }

    #[test]
    fn test_existing_subfolder_declined() {
        let root = TempDir::new().unwrap();
        let existing = root.path().join("2022-11-20");
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("keep.png"), b"old").unwrap();

        let result = stage(root.path(), day(), || false);
        assert!(matches!(result, Err(AcquisitionError::AbortedByUser(p)) if p == existing));
        assert_eq!(fs::read(existing.join("keep.png")).unwrap(), b"old");
    }

    #[test]
    fn test_missing_root_is_not_writable() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");
        let result = stage(&missing, day(), || true);
        assert!(matches!(result, Err(AcquisitionError::RootNotWritable(_))));
        assert!(!missing.exists());
    }

    #[test]
    fn test_readonly_root() {
        let root = TempDir::new().unwrap();
        let locked = root.path().join("unwritable_folder");
        fs::create_dir(&locked).unwrap();
        let mut perms = fs::metadata(&locked).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&locked, perms.clone()).unwrap();

        let result = stage(&locked, day(), || true);
        assert!(matches!(result, Err(AcquisitionError::RootNotWritable(_))));
        assert!(!locked.join("2022-11-20").exists());

        perms.set_readonly(false);
        fs::set_permissions(&locked, perms).unwrap();
    }

    // Write bits for group and other, none for the owner: the mode alone looks
    // writable but access(2) refuses. Root bypasses the bits, so skip there.
    #[cfg(unix)]
    #[test]
    fn test_root_without_owner_write_permission() {
        use std::os::unix::fs::PermissionsExt;
        if unsafe { libc::geteuid() } == 0 {
            return;
        }
        let root = TempDir::new().unwrap();
        let locked = root.path().join("not_mine_to_write");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o577)).unwrap();
        assert!(!fs::metadata(&locked).unwrap().permissions().readonly());

        let result = stage(&locked, day(), || true);
        assert!(matches!(result, Err(AcquisitionError::RootNotWritable(_))));
        assert!(!locked.join("2022-11-20").exists());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_writable_root() {
        let root = TempDir::new().unwrap();
        assert!(is_writable_dir(root.path()));
        assert!(!is_writable_dir(&root.path().join("missing")));
    }

    #[test]
    fn test_subfolder_name_taken_by_file() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("2022-11-20"), b"not a dir").unwrap();
        let result = stage(root.path(), day(), || true);
        assert!(matches!(result, Err(AcquisitionError::DirectoryCreateFailed { .. })));
    }
}

//! Writing encoded bytes to storage.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `data` to `path`, replacing any existing file.
///
/// The bytes go to a hidden sibling (`.<name>.partial`) first and are renamed
/// into place once flushed, so a failed write never leaves a truncated
/// destination behind. New files are `rw-r--r--` on Unix.
pub(crate) fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp = partial_path(path)?;

    let result = write_temp(&temp, data).and_then(|()| fs::rename(&temp, path));
    if result.is_err() {
        // Best-effort cleanup
        let _ = fs::remove_file(&temp);
    }
    result
}

fn partial_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let mut partial = std::ffi::OsString::from(".");
    partial.push(name);
    partial.push(".partial");
    Ok(path.with_file_name(partial))
}

fn write_temp(temp: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = create(temp)?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(unix)]
fn create(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
}

#[cfg(not(unix))]
fn create(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_and_overwrites() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let path = dir.join("out.png");

        write_file(&path, b"first").unwrap();
        write_file(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.join(".out.png.partial").exists());
    }

    #[cfg(unix)]
    #[test]
    fn new_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let path = dir.join("out.jpg");
        write_file(&path, b"data").unwrap();

        // umask may clear bits but never adds any
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o600, 0);
    }

    #[test]
    fn missing_directory_leaves_nothing() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let path = dir.join("missing").join("out.png");

        assert!(write_file(&path, b"data").is_err());
        assert!(!path.exists());
        assert!(!dir.join("missing").exists());
    }

    #[test]
    fn rejects_path_without_name() {
        let err = write_file(Path::new("/"), b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}

//! I/O utilities for schema and batch files.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crc32fast::Hasher;

use crate::error::SyncError;

/// Classifies I/O errors into specific SyncError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> SyncError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            SyncError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            SyncError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => SyncError::IoError(format!("{}: {}", context, error)),
    }
}

/// Writes `contents` to `path` through a `.tmp` sibling, fsync and rename.
///
/// # Arguments
/// * `path` - Final file path
/// * `contents` - Bytes to write
///
/// # Returns
/// `Result<(), SyncError>` indicating success or failure.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| classify_io_error(e, "Failed to create directory"))?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    let mut file =
        File::create(temp_path).map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(contents)
        .map_err(|e| classify_io_error(e, "Failed to write file"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync file"))?;

    // Atomic rename
    fs::rename(temp_path, path).map_err(|e| classify_io_error(e, "Failed to rename file"))?;
    Ok(())
}

/// Calculates the CRC32 checksum of a file.
pub fn file_checksum(path: &Path) -> Result<u32, SyncError> {
    let mut file = File::open(path).map_err(|e| classify_io_error(e, "Failed to open file"))?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; 65536];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| classify_io_error(e, "Failed to read file"))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;
    use tempfile::tempdir;

    #[timeout(1000)]
    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.json");
        write_atomic(&path, b"{}").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"{}");
        assert!(!dir.path().join("nested").join("schema.json.tmp").exists());
    }

    #[timeout(1000)]
    #[test]
    fn test_file_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("part.json");
        fs::write(&path, b"123456789").unwrap();
        assert_eq!(file_checksum(&path).unwrap(), 0xCBF4_3926);
    }

    #[timeout(1000)]
    #[test]
    fn test_classify_not_found() {
        let err = classify_io_error(std::io::Error::from(ErrorKind::NotFound), "open");
        assert!(matches!(err, SyncError::IoError(ref m) if m.starts_with("open:")));
    }
}

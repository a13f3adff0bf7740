//! Patch file writer.
//!
//! ## `write_patch_file` protocol
//!
//! 1. Render all blocks into the final text (one allocation).
//! 2. Write to `<path>.tmp` in the same directory.
//! 3. Rename onto `<path>` (atomic on POSIX; replaces any previous run's file).
//! 4. On rename failure, remove the `.tmp` and leave the old file intact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use patchgen_core::{render_patch_file, PatchBlock};

use crate::error::{io_err, SyncError};

/// Write `blocks` to `path`, replacing any existing file.
///
/// Returns the number of bytes written.
pub fn write_patch_file(path: &Path, blocks: &[PatchBlock]) -> Result<usize, SyncError> {
    let content = render_patch_file(blocks);
    write_with_tmp(path, &content, &tmp_path_for(path))?;
    Ok(content.len())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

fn write_with_tmp(path: &Path, content: &[u8], tmp: &Path) -> Result<(), SyncError> {
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use patchgen_core::ShaPair;
    use tempfile::TempDir;

    #[test]
    fn empty_block_list_writes_single_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("foo.bar.patch");
        let written = write_patch_file(&path, &[]).unwrap();
        assert_eq!(written, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "\n");
    }

    #[test]
    fn rerun_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("foo.bar.patch");
        fs::write(&path, "stale content from an earlier run\n").unwrap();

        let blocks = vec![PatchBlock::new(&ShaPair::new("a1", "b1"), "D1\n")];
        write_patch_file(&path, &blocks).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "compare a1 b1\nD1\n\n");
    }

    #[test]
    fn latin1_body_is_written_byte_for_byte() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.patch");
        let blocks = vec![PatchBlock::new(&ShaPair::new("a", "b"), b"+caf\xe9\n".to_vec())];
        let written = write_patch_file(&path, &blocks).unwrap();
        let content = fs::read(&path).unwrap();
        assert_eq!(content, b"compare a b\n+caf\xe9\n\n");
        assert_eq!(written, content.len());
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.patch");
        write_patch_file(&path, &[]).unwrap();
        assert!(!tmp_path_for(&path).exists(), ".tmp must be cleaned up");
    }

    #[test]
    fn missing_parent_directory_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone").join("foo.bar.patch");
        let err = write_patch_file(&path, &[]).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();
        let path = readonly_dir.join("foo.bar.patch");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("foo.bar.patch.tmp");
        let result = write_with_tmp(&path, b"new content", &tmp_path);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Root ignores directory permissions; only assert when the rename was refused.
        if result.is_err() {
            assert_eq!(fs::read_to_string(&path).unwrap(), "original");
            assert!(!tmp_path.exists(), ".tmp should be cleaned up");
        }
    }
}

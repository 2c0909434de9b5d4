// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

pub mod mock;

/// Abstract filesystem interface.
///
/// The regeneration core only ever needs three operations: reading small
/// text files, replacing them atomically, and observing modification times
/// (of files *and* directories; directory mtimes are the change signal).
/// Keeping the surface this small lets tests drive mtime scenarios through
/// [`mock::MockFileSystem`] without sleeping on real directory timestamps.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace `path` with `contents` in one step.
    ///
    /// A reader must never observe a half-written file: a torn cache write
    /// could mask a real pending change on the next invocation.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Modification time in nanoseconds since the epoch.
    fn mtime_ns(&self, path: &Path) -> io::Result<u64>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write to a sibling temp file, then rename over the target.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache".to_string());
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)
    }

    fn mtime_ns(&self, path: &Path) -> io::Result<u64> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0))
    }
}

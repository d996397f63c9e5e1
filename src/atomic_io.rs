//! Crash-safe file writes.
//!
//! Every output file the build produces — rendered pages, the asset
//! manifest, provenance records, processed images — goes through this
//! module rather than `std::fs::write` directly, so that a process killed
//! mid-write (or two threads racing on the same path) never leaves behind
//! a half-written file.
//!
//! Algorithm: write to a hidden temp file in the *same* directory as the
//! target (so the final rename is same-filesystem and therefore atomic),
//! then rename over the target. On POSIX the parent directory is fsync'd
//! after the rename so the rename itself survives a crash. On any failure
//! the temp file is removed.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Per-process counter mixed into every temp filename so concurrent
/// writers targeting the same path never pick the identical name.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `content` to `path` atomically, creating parent directories as
/// needed. Concurrent writers to the same `path` race on the rename; the
/// last one to rename wins and no partial file is ever observable.
pub fn write_bytes(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = parent_dir(path)?;
    fs::create_dir_all(&dir)?;

    let tmp_path = temp_path_in(&dir, path);
    let result = (|| -> io::Result<()> {
        write_temp(&tmp_path, content)?;
        fs::rename(&tmp_path, path)?;
        fsync_dir(&dir)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Write a UTF-8 string atomically. See [`write_bytes`].
pub fn write_text(path: &Path, content: &str) -> io::Result<()> {
    write_bytes(path, content.as_bytes())
}

/// A scoped writer: buffers writes in memory and commits them atomically
/// when `commit()` is called (or dropped without committing, in which
/// case nothing is written — there is no implicit commit-on-drop, since a
/// dropped-without-commit writer usually means the caller bailed out on
/// an error partway through producing content).
pub struct ScopedWriter {
    path: PathBuf,
    buffer: Vec<u8>,
}

impl ScopedWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: Vec::new(),
        }
    }

    pub fn commit(self) -> io::Result<()> {
        write_bytes(&self.path, &self.buffer)
    }
}

impl Write for ScopedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn parent_dir(path: &Path) -> io::Result<PathBuf> {
    path.parent()
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory"))
}

fn temp_path_in(dir: &Path, target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("tmp");
    let pid = std::process::id();
    let thread = format!("{:?}", std::thread::current().id());
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = crate::hash::hash_bytes(format!("{pid}-{thread}-{seq}").as_bytes()).to_fingerprint();
    dir.join(format!(".{file_name}.{suffix}.tmp"))
}

fn write_temp(tmp_path: &Path, content: &[u8]) -> io::Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    opts.mode(0o644);
    let mut file: File = opts.open(tmp_path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    let dir_file = File::open(dir)?;
    dir_file.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        write_text(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_text(&path, "nested").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "nested");
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        write_text(&path, "first").unwrap();
        write_text(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        write_text(&path, "content").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_scoped_writer_commits_on_call() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scoped.txt");
        let mut w = ScopedWriter::new(&path);
        w.write_all(b"scoped content").unwrap();
        w.commit().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "scoped content");
    }

    #[test]
    fn test_scoped_writer_drop_without_commit_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uncommitted.txt");
        {
            let mut w = ScopedWriter::new(&path);
            w.write_all(b"never written").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_writers_last_rename_wins() {
        use std::sync::Arc;
        use std::thread;

        let dir = Arc::new(TempDir::new().unwrap());
        let path = dir.path().join("race.txt");
        let mut handles = Vec::new();
        for i in 0..8 {
            let path = path.clone();
            handles.push(thread::spawn(move || {
                write_text(&path, &format!("writer-{i}")).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        // Exactly one writer's content survives, and it's a complete write.
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("writer-"));
    }
}

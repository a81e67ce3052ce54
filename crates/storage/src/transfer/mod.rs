//! Moving and copying drawings between directories.
//!
//! Every transfer tries the cheap thing first: a rename (for moves) or a hard
//! link (for copies). Those are atomic and cost nothing when source and
//! destination share a volume. Only when the OS reports that the operation
//! would cross a device does the layer fall back to actually copying bytes,
//! and only after checking that the destination isn't already an identical
//! file (same size, same modification time).
//!
//! The byte copy is delegated to an external [`BulkCopy`] utility when one is
//! available, because it copes with flaky network shares far better than a
//! plain read/write loop. Without one, the copy happens in-process.

mod bulk;

pub use self::bulk::{BulkCopy, BulkCopySettings, Mode};
use crate::error::{ErrorKind, Result};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// How a transfer was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Renamed,
    Linked,
    /// Copied in-process.
    Copied,
    /// Copied by the external utility.
    BulkCopied,
    /// Destination already held the same file; nothing was copied.
    Identical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    /// Where the file now lives.
    pub path: PathBuf,
    pub method: Method,
}

/// File transfer with a same-volume fast path and a cross-volume fallback.
#[derive(Debug, Clone, Default)]
pub struct Transfer {
    bulk: Option<BulkCopy>,
}
impl Transfer {
    pub fn new(bulk: Option<BulkCopy>) -> Self {
        Self { bulk }
    }

    /// Looks for the bulk-copy utility described by `settings`.
    pub fn discover(settings: BulkCopySettings) -> Self {
        Self::new(BulkCopy::discover(settings))
    }

    /// Moves `src` into `dst_dir` (created if needed), keeping its name. An
    /// existing file of that name is replaced.
    pub async fn move_to(&self, src: &Path, dst_dir: &Path) -> Result<Transferred> {
        let dst = destination(src, dst_dir)?;
        fs::create_dir_all(dst_dir).await.map_err(|e| ErrorKind::from_io(e, dst_dir))?;
        match fs::rename(src, &dst).await {
            Ok(()) => Ok(Transferred { path: dst, method: Method::Renamed }),
            Err(e) if e.kind() == IoErrorKind::CrossesDevices => {
                tracing::debug!(src = %src.display(), dst = %dst.display(), "Rename crosses volumes; copying instead");
                self.fallback(src, &dst, Mode::Move).await
            },
            Err(e) => exn::bail!(ErrorKind::from_io(e, src)),
        }
    }

    /// Makes `dst` a copy of `src`, hard-linking when possible.
    pub async fn copy_or_link_to(&self, src: &Path, dst: &Path) -> Result<Transferred> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, parent))?;
        }
        let mut replaced = false;
        loop {
            match fs::hard_link(src, dst).await {
                Ok(()) => return Ok(Transferred { path: dst.to_path_buf(), method: Method::Linked }),
                Err(e) if e.kind() == IoErrorKind::AlreadyExists && !replaced => {
                    if identical(src, dst).await {
                        return Ok(Transferred { path: dst.to_path_buf(), method: Method::Identical });
                    }
                    fs::remove_file(dst).await.map_err(|e| ErrorKind::from_io(e, dst))?;
                    replaced = true;
                },
                Err(e) if e.kind() == IoErrorKind::CrossesDevices => return self.fallback(src, dst, Mode::Copy).await,
                Err(e) => exn::bail!(ErrorKind::from_io(e, src)),
            }
        }
    }

    async fn fallback(&self, src: &Path, dst: &Path, mode: Mode) -> Result<Transferred> {
        if identical(src, dst).await {
            if mode == Mode::Move {
                fs::remove_file(src).await.map_err(|e| ErrorKind::from_io(e, src))?;
            }
            return Ok(Transferred { path: dst.to_path_buf(), method: Method::Identical });
        }
        // The utility can only keep the file name; anything else is copied here.
        if let (Some(bulk), Some(dst_dir)) = (&self.bulk, dst.parent())
            && src.file_name() == dst.file_name()
        {
            bulk.run(src, dst_dir, mode).await?;
            return Ok(Transferred { path: dst.to_path_buf(), method: Method::BulkCopied });
        }
        fs::copy(src, dst).await.map_err(|e| ErrorKind::from_io(e, src))?;
        if mode == Mode::Move {
            fs::remove_file(src).await.map_err(|e| ErrorKind::from_io(e, src))?;
        }
        Ok(Transferred { path: dst.to_path_buf(), method: Method::Copied })
    }
}

fn destination(src: &Path, dst_dir: &Path) -> Result<PathBuf> {
    match src.file_name() {
        Some(name) => Ok(dst_dir.join(name)),
        None => exn::bail!(ErrorKind::InvalidPath(src.to_path_buf())),
    }
}

/// Same size and same modification time. Any error reading either side means
/// "not identical".
async fn identical(src: &Path, dst: &Path) -> bool {
    let (Ok(a), Ok(b)) = (fs::metadata(src).await, fs::metadata(dst).await) else {
        return false;
    };
    a.len() == b.len() && matches!((a.modified(), b.modified()), (Ok(x), Ok(y)) if x == y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, data: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    #[tokio::test]
    async fn test_move_renames_and_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("landing/DAM1.tif");
        write(&src, b"data");
        let dst_dir = temp.path().join("archive/costruttivi/Am");
        let moved = Transfer::default().move_to(&src, &dst_dir).await.unwrap();
        assert_eq!(moved.method, Method::Renamed);
        assert_eq!(moved.path, dst_dir.join("DAM1.tif"));
        assert!(!src.exists());
        assert_eq!(std::fs::read(&moved.path).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_move_missing_source() {
        let temp = tempfile::tempdir().unwrap();
        let err = Transfer::default().move_to(&temp.path().join("nope.tif"), temp.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_links() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("archive/DAM1.tif");
        write(&src, b"data");
        let dst = temp.path().join("staging/DAM1.tif");
        let copied = Transfer::default().copy_or_link_to(&src, &dst).await.unwrap();
        assert_eq!(copied.method, Method::Linked);
        assert!(src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");

        // Second time round the link is already there.
        let again = Transfer::default().copy_or_link_to(&src, &dst).await.unwrap();
        assert_eq!(again.method, Method::Identical);
    }

    #[tokio::test]
    async fn test_copy_replaces_different_file() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("archive/DAM1.tif");
        write(&src, b"new revision data");
        let dst = temp.path().join("staging/DAM1.tif");
        write(&dst, b"old");
        let copied = Transfer::default().copy_or_link_to(&src, &dst).await.unwrap();
        assert_eq!(copied.method, Method::Linked);
        assert_eq!(std::fs::read(&dst).unwrap(), b"new revision data");
    }

    #[tokio::test]
    async fn test_fallback_copies_in_process() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("landing/DAM1.tif");
        write(&src, b"data");
        let dst = temp.path().join("archive/DAM1.tif");
        std::fs::create_dir_all(dst.parent().unwrap()).unwrap();
        let moved = Transfer::default().fallback(&src, &dst, Mode::Move).await.unwrap();
        assert_eq!(moved.method, Method::Copied);
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_fallback_skips_identical() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("landing/DAM1.tif");
        write(&src, b"data");
        let dst = temp.path().join("staging/DAM1.tif");
        std::fs::create_dir_all(dst.parent().unwrap()).unwrap();
        std::fs::copy(&src, &dst).unwrap();
        let modified = std::fs::metadata(&src).unwrap().modified().unwrap();
        std::fs::File::options().write(true).open(&dst).unwrap().set_modified(modified).unwrap();

        let copied = Transfer::default().fallback(&src, &dst, Mode::Copy).await.unwrap();
        assert_eq!(copied.method, Method::Identical);
        assert!(src.exists());
    }
}

//! Landing directory housekeeping.

use crate::error::{ErrorKind, Result};
use crate::listing::enumerate;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Renames `*.TIF`, `*.tiff` and `*.TIFF` files in `dir` to `*.tif`, returning
/// how many were renamed. Not recursive. A file that can't be renamed is
/// logged and left as it is; only failing to read `dir` is an error.
///
/// `X.TIF` goes through `X.tiff` first: on a case-insensitive file system a
/// direct `X.TIF` to `X.tif` rename can be silently treated as a no-op.
pub async fn normalize_extensions(dir: &Path) -> Result<usize> {
    let mut renamed = 0;
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => exn::bail!(ErrorKind::from_io(e, dir)),
    };
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, dir))? {
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if extension == "tif" || !(extension.eq_ignore_ascii_case("tif") || extension.eq_ignore_ascii_case("tiff")) {
            continue;
        }
        if !entry.file_type().await.is_ok_and(|kind| kind.is_file()) {
            continue;
        }
        let target = path.with_extension("tif");
        match rename_to_tif(&path, &target, extension == "TIF").await {
            Ok(()) => {
                tracing::debug!(from = %path.display(), to = %target.display(), "Normalized extension");
                renamed += 1;
            },
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not normalize extension; skipping"),
        }
    }
    Ok(renamed)
}

async fn rename_to_tif(path: &Path, target: &Path, via_interim: bool) -> std::io::Result<()> {
    if via_interim {
        let interim = path.with_extension("tiff");
        fs::rename(path, &interim).await?;
        fs::rename(&interim, target).await
    } else {
        fs::rename(path, target).await
    }
}

/// Files in `dir` waiting to be archived, sorted by name: every `.tif`, and
/// every `.pdf` too when `include_pdf` is set.
pub async fn candidates(dir: &Path, include_pdf: bool) -> Result<Vec<PathBuf>> {
    let names = enumerate(dir).await?;
    Ok(names
        .into_iter()
        .filter(|name| {
            name.rsplit_once('.').is_some_and(|(_, ext)| {
                ext.eq_ignore_ascii_case("tif") || (include_pdf && ext.eq_ignore_ascii_case("pdf"))
            })
        })
        .map(|name| dir.join(name))
        .collect())
}

/// Number of drawing files (`.tif` or `.pdf`) queued in `dir`.
pub async fn count_drawings(dir: &Path) -> Result<usize> {
    Ok(enumerate(dir).await?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DAM123456R01S01M.TIF", "DAM123456R01S01M.tif")]
    #[case("DAM123456R01S01M.tiff", "DAM123456R01S01M.tif")]
    #[case("DAM123456R01S01M.TIFF", "DAM123456R01S01M.tif")]
    #[case("DAM123456R01S01M.Tif", "DAM123456R01S01M.tif")]
    #[tokio::test]
    async fn test_normalizes(#[case] original: &str, #[case] expected: &str) {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(original), b"0").unwrap();
        assert_eq!(normalize_extensions(temp.path()).await.unwrap(), 1);
        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![expected.to_string()]);
    }

    #[tokio::test]
    async fn test_leaves_others_alone() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["DAM123456R01S01M.tif", "DAM123456R01S01M.pdf", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"0").unwrap();
        }
        std::fs::create_dir(temp.path().join("folder.TIF")).unwrap();
        assert_eq!(normalize_extensions(temp.path()).await.unwrap(), 0);
        assert!(temp.path().join("folder.TIF").is_dir());
    }

    #[rstest]
    #[case(true, &["DAM1.pdf", "DAM2.tif", "DAM3.PDF"])]
    #[case(false, &["DAM2.tif"])]
    #[tokio::test]
    async fn test_candidates(#[case] include_pdf: bool, #[case] expected: &[&str]) {
        let temp = tempfile::tempdir().unwrap();
        for name in ["DAM3.PDF", "DAM2.tif", "DAM1.pdf", "DAM0.DESEDI", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"0").unwrap();
        }
        let found = candidates(temp.path(), include_pdf).await.unwrap();
        let expected: Vec<_> = expected.iter().map(|name| temp.path().join(name)).collect();
        assert_eq!(found, expected);
        assert_eq!(count_drawings(temp.path()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_skips_file_that_cannot_be_renamed() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("DAM654321R01S01M.TIFF"), b"0").unwrap();
        std::fs::write(temp.path().join("DAM123456R01S01M.tiff"), b"0").unwrap();
        // A non-empty directory sits where the renamed file would go.
        std::fs::create_dir(temp.path().join("DAM654321R01S01M.tif")).unwrap();
        std::fs::write(temp.path().join("DAM654321R01S01M.tif/keep"), b"0").unwrap();

        assert_eq!(normalize_extensions(temp.path()).await.unwrap(), 1);
        assert!(temp.path().join("DAM654321R01S01M.TIFF").is_file());
        assert!(temp.path().join("DAM123456R01S01M.tif").is_file());
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(normalize_extensions(&temp.path().join("missing")).await.unwrap(), 0);
    }
}

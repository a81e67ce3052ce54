//! Orientation checks for raster drawings.

use archivist_tiff::Orientation;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tells which way up a raster drawing is. Implementations are blocking and
/// must never fail: anything they can't read is
/// [`Indeterminate`](Orientation::Indeterminate).
pub trait OrientationCheck: Send + Sync {
    fn orientation(&self, path: &Path) -> Orientation;
}

/// Reads the TIFF header.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffHeader;
impl OrientationCheck for TiffHeader {
    fn orientation(&self, path: &Path) -> Orientation {
        archivist_tiff::orientation(path)
    }
}

/// Runs `check` on the blocking pool.
pub(crate) async fn check(check: &Arc<dyn OrientationCheck>, path: &Path) -> Orientation {
    let (check, path): (_, PathBuf) = (Arc::clone(check), path.to_path_buf());
    tokio::task::spawn_blocking(move || check.orientation(&path)).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Orientation check panicked");
        Orientation::Indeterminate
    })
}

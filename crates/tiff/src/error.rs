//! TIFF Error Types

use derive_more::{Display, Error};

/// A TIFF header error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for header parsing.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or seeking the file failed (including truncated files).
    #[display("I/O error")]
    Io,
    /// Byte-order mark or magic number is wrong.
    #[display("not a classic TIFF file")]
    NotTiff,
    /// The first image directory has no width or no height entry.
    #[display("image dimensions missing from header")]
    MissingDimensions,
    /// Width or height is stored with a field type other than SHORT or LONG.
    #[display("unsupported field type {_0} for image dimension")]
    UnsupportedFieldType(#[error(not(source))] u16),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}

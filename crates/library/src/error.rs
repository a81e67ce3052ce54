//! Library Error Types
//!
//! Per-file outcomes are not errors; see [`Reason`](crate::Reason). These
//! cover the operational failures underneath them.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Normalizing or enumerating the landing directory failed.
    #[display("could not read the landing directory")]
    Landing,
    /// A listing or transfer operation failed.
    #[display("storage operation failed")]
    Storage,
    /// A metadata side-file could not be written.
    #[display("could not write metadata side-file")]
    Sidecar,
    /// The decision log could not be appended to.
    #[display("could not append to the decision log")]
    Journal,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // All of these are I/O against shares that come and go.
        true
    }
}

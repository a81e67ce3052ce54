//! Naming Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a file name was refused.
///
/// The grammar check ([`InvalidName`](Self::InvalidName)) always runs first;
/// the code checks run in declaration order on names that passed it, so a
/// name only ever reports the first problem found.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The name does not match the drawing grammar at all.
    #[display("file name does not match the drawing grammar: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// Paper-size letter outside `A`..=`E`.
    #[display("unknown format code: {_0}")]
    InvalidFormatCode(#[error(not(source))] char),
    /// Business category letter outside the recognized set.
    #[display("unknown location code: {_0}")]
    InvalidLocationCode(#[error(not(source))] char),
    /// Unit letter outside `M`, `I`, `D`, `N`.
    #[display("unknown metric code: {_0}")]
    InvalidMetricCode(#[error(not(source))] char),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A name is either valid or it isn't; renaming the file is the only fix.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::InvalidName("foo.tif".to_string()).to_string(),
            "file name does not match the drawing grammar: foo.tif"
        );
        assert_eq!(ErrorKind::InvalidMetricCode('X').to_string(), "unknown metric code: X");
    }
}

//! Drawing file names and where they belong.
//!
//! - [`ParsedName`]: the `D<format><location><docnum>R<rev>S<sheet><metric>.<tif|pdf>`
//!   grammar, plus semantic validation of the code letters.
//! - [`SpecSheetName`]: the secondary specification-sheet grammar.
//! - [`location`]: the precedence-ordered rule table mapping a name onto an
//!   archive subdirectory.

mod codes;
mod consts;
pub mod error;
pub mod location;
mod name;
mod spec_sheet;

pub use crate::codes::{PaperSize, Unit};
pub use crate::consts::RECOGNIZED_EXTENSIONS;
pub use crate::location::{LocationInfo, resolve};
pub use crate::name::{DocumentKey, FileKind, ParsedName, Revision, Sheet};
pub use crate::spec_sheet::SpecSheetName;

/// Returns `true` if `file_name` ends in one of the [`RECOGNIZED_EXTENSIONS`]
/// (case-insensitive).
pub fn has_recognized_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| RECOGNIZED_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

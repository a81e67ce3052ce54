//! Impeller specification sheet names.
//!
//! Spec sheets are not archived by a pass. They reach the document importer
//! through a separate loader, which uses this grammar together with
//! `Fields::for_spec_sheet` in the library crate to build their side-files.

use crate::consts::SPEC_SHEET_REGEX;
use crate::error::{ErrorKind, Result};
use crate::name::{Revision, Sheet};

/// An impeller specification sheet, the secondary document class.
///
/// These never go through revision resolution; they only need enough
/// structure to produce a metadata side-file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetName {
    pub file_name: String,
    /// Stem minus the trailing revision/sheet block.
    pub document_number: String,
    pub revision: Revision,
    pub sheet: Sheet,
}
impl SpecSheetName {
    pub fn parse(file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        let Some(captures) = SPEC_SHEET_REGEX.captures(&file_name) else {
            exn::bail!(ErrorKind::InvalidName(file_name));
        };
        let text = |i: usize| captures.get(i).map(|m| m.as_str()).unwrap_or_default();
        let revision = text(4).parse()?;
        let sheet = text(5).parse()?;
        // Stem is always 24 characters here; the document number is everything
        // up to and including `ISS`.
        let stem: Vec<char> = file_name.chars().take(file_name.chars().count() - 4).collect();
        let document_number = stem.iter().take(18).chain(stem.iter().skip(24)).collect();
        Ok(Self { document_number, revision, sheet, file_name })
    }

    pub fn stem(&self) -> &str {
        &self.file_name[..self.file_name.len() - 4]
    }
}

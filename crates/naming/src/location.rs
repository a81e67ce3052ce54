//! Archive location rules.
//!
//! Maps a [`ParsedName`] onto the archive subdirectory it belongs in. Most
//! business categories are identified by the location letter alone, but two
//! (electrical P&IDs and piping) are identified by the first digit of the
//! document number. Rules are tried in a fixed precedence:
//!
//! 1. [`Matcher::Exact`]: location letter *and* leading digit
//! 2. [`Matcher::Location`]: location letter only
//! 3. [`Matcher::LeadingDigit`]: leading digit only
//! 4. [`DEFAULT_CATEGORY`]
//!
//! Precedence comes from the matcher kind, not from table order.

use crate::name::ParsedName;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Detail,
    CustomerDrawings,
    VendorSuppliedData,
}
impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Detail => "DETAIL",
            DocumentType::CustomerDrawings => "Customer Drawings",
            DocumentType::VendorSuppliedData => "Vendor Supplied Data",
        }
    }
}
impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A business category: where its drawings live and how they are described.
#[derive(Debug, PartialEq, Eq)]
pub struct Category {
    /// Folder directly under the archive root.
    pub folder: &'static str,
    /// Human-readable name used in the decision log.
    pub label: &'static str,
    /// Appended to the format letter to name the subfolder (`A` + `m` = `Am`).
    pub suffix: &'static str,
    pub document_type: DocumentType,
    pub language: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Exact { location: char, digit: char },
    Location(char),
    LeadingDigit(char),
}
impl Matcher {
    fn precedence(&self) -> u8 {
        match self {
            Matcher::Exact { .. } => 0,
            Matcher::Location(_) => 1,
            Matcher::LeadingDigit(_) => 2,
        }
    }

    fn matches(&self, name: &ParsedName) -> bool {
        match *self {
            Matcher::Exact { location, digit } => name.location == location && name.leading_digit() == digit,
            Matcher::Location(location) => name.location == location,
            Matcher::LeadingDigit(digit) => name.leading_digit() == digit,
        }
    }
}

#[derive(Debug)]
pub struct LocationRule {
    pub when: Matcher,
    pub category: Category,
}

macro_rules! category {
    ($folder:literal, $label:literal, $suffix:literal, $doctype:ident, $lang:literal) => {
        Category {
            folder: $folder,
            label: $label,
            suffix: $suffix,
            document_type: DocumentType::$doctype,
            language: $lang,
        }
    };
}

#[rustfmt::skip]
pub static RULES: &[LocationRule] = &[
    LocationRule { when: Matcher::Location('M'), category: category!("costruttivi", "Costruttivi", "m", Detail, "Italian") },
    LocationRule { when: Matcher::Location('K'), category: category!("bozzetti", "Bozzetti", "k", CustomerDrawings, "English") },
    LocationRule { when: Matcher::Location('F'), category: category!("fornitori", "Fornitori", "f", VendorSuppliedData, "English") },
    LocationRule { when: Matcher::Location('T'), category: category!("tenute_meccaniche", "T_meccaniche", "t", CustomerDrawings, "English") },
    LocationRule { when: Matcher::Location('E'), category: category!("sezioni", "Sezioni", "s", CustomerDrawings, "English") },
    LocationRule { when: Matcher::Location('S'), category: category!("sezioni", "Sezioni", "s", CustomerDrawings, "English") },
    LocationRule { when: Matcher::Location('N'), category: category!("marcianise", "Marcianise", "n", Detail, "Italian") },
    LocationRule { when: Matcher::Location('P'), category: category!("preventivi", "Preventivi", "p", CustomerDrawings, "English") },
    LocationRule { when: Matcher::LeadingDigit('4'), category: category!("pID_ELETTRICI", "Pid_Elettrici", "m", CustomerDrawings, "Italian") },
    LocationRule { when: Matcher::LeadingDigit('5'), category: category!("piping", "Piping", "m", CustomerDrawings, "Italian") },
];

pub static DEFAULT_CATEGORY: Category = category!("unknown", "Unknown", "m", CustomerDrawings, "English");

/// Where a drawing is archived, and the descriptive metadata that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub category: &'static Category,
    /// Format letter plus category suffix, e.g. `Am`.
    pub subfolder: String,
    /// `<archive root>/<category folder>/<subfolder>`.
    pub directory: PathBuf,
}
impl LocationInfo {
    pub fn label(&self) -> &'static str {
        self.category.label
    }

    pub fn document_type(&self) -> DocumentType {
        self.category.document_type
    }

    pub fn language(&self) -> &'static str {
        self.category.language
    }
}

/// Picks the category for `name` from `rules`, falling back to
/// [`DEFAULT_CATEGORY`].
pub fn category_for<'a>(rules: &'a [LocationRule], name: &ParsedName) -> &'a Category {
    rules
        .iter()
        .filter(|rule| rule.when.matches(name))
        // `min_by_key` keeps the first of equal minimums, so table order only
        // breaks ties within a precedence level.
        .min_by_key(|rule| rule.when.precedence())
        .map(|rule| &rule.category)
        .unwrap_or(&DEFAULT_CATEGORY)
}

/// Resolves the archive directory for `name` under `archive_root`.
pub fn resolve(name: &ParsedName, archive_root: impl AsRef<Path>) -> LocationInfo {
    let category = category_for(RULES, name);
    let subfolder = format!("{}{}", name.format, category.suffix);
    let directory = archive_root.as_ref().join(category.folder).join(&subfolder);
    tracing::trace!(file = %name.file_name, folder = category.folder, %subfolder, "Resolved archive location");
    LocationInfo { category, subfolder, directory }
}

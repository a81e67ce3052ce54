use crate::codes::{PaperSize, Unit};
use crate::consts::{DRAWING_NAME_REGEX, LOCATION_CODES};
use crate::error::{Error, ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

macro_rules! two_digit {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u8);
        impl $name {
            pub fn new(value: u8) -> Option<Self> {
                (value < 100).then_some(Self(value))
            }

            pub fn value(&self) -> u8 {
                self.0
            }
        }
        impl FromStr for $name {
            type Err = Error;
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
                    exn::bail!(ErrorKind::InvalidName(format!("{} `{}`", $field, s)));
                }
                // Two ASCII digits always fit.
                Ok(Self(s.parse().unwrap_or_default()))
            }
        }
        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                write!(f, "{:02}", self.0)
            }
        }
    };
}

two_digit!(
    /// Revision marker. Ordered numerically (`09 < 10`), displayed zero-padded.
    Revision,
    "revision"
);
two_digit!(
    /// Sheet number; each sheet carries its own revision lineage.
    Sheet,
    "sheet"
);

/// Which of the two recognized drawing formats a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `.tif` raster scan.
    Raster,
    /// `.pdf` document.
    Document,
}
impl FileKind {
    /// The value the downstream importer expects in the `FileType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Raster => "Tiff",
            FileKind::Document => "Pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Raster => "tif",
            FileKind::Document => "pdf",
        }
    }
}

/// Identity shared by every revision and sheet of one drawing: the leading
/// `D`, format, location and document number, uppercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentKey(String);
impl DocumentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive check that `file_name` belongs to this document.
    pub fn prefixes(&self, file_name: &str) -> bool {
        file_name.len() >= self.0.len()
            && file_name.is_char_boundary(self.0.len())
            && file_name[..self.0.len()].eq_ignore_ascii_case(&self.0)
    }
}
impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// A drawing file name broken into its typed fields.
///
/// Constructed by [`ParsedName::parse`], which only checks the grammar. The
/// individual code letters are kept as uppercased `char`s so that routing
/// rules can still inspect a name whose codes turn out to be unknown; call
/// [`validate`](Self::validate) before trusting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// The original file name, untouched.
    pub file_name: String,
    /// Paper-size letter.
    pub format: char,
    /// Business category letter.
    pub location: char,
    /// Six-digit document number.
    pub document_number: String,
    pub revision: Revision,
    pub sheet: Sheet,
    /// Unit letter.
    pub metric: char,
    pub kind: FileKind,
}
impl ParsedName {
    /// Matches `file_name` against the drawing grammar (case-insensitive,
    /// whole string).
    ///
    /// # Errors
    /// [`ErrorKind::InvalidName`] when the grammar does not match.
    pub fn parse(file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        let Some(captures) = DRAWING_NAME_REGEX.captures(&file_name) else {
            exn::bail!(ErrorKind::InvalidName(file_name));
        };
        let letter = |i: usize| captures.get(i).and_then(|m| m.as_str().chars().next()).map(|c| c.to_ascii_uppercase());
        let text = |i: usize| captures.get(i).map(|m| m.as_str()).unwrap_or_default();
        let (Some(format), Some(location), Some(metric)) = (letter(1), letter(2), letter(6)) else {
            exn::bail!(ErrorKind::InvalidName(file_name));
        };
        let kind = if text(7).eq_ignore_ascii_case("pdf") { FileKind::Document } else { FileKind::Raster };
        let document_number = text(3).to_string();
        let revision = text(4).parse()?;
        let sheet = text(5).parse()?;
        Ok(Self { format, location, document_number, revision, sheet, metric, kind, file_name })
    }

    /// Semantic checks on the code letters: format, then location, then
    /// metric. Only the first failure is reported.
    pub fn validate(&self) -> Result<()> {
        if PaperSize::from_code(self.format).is_none() {
            exn::bail!(ErrorKind::InvalidFormatCode(self.format));
        }
        if !LOCATION_CODES.contains(self.location) {
            exn::bail!(ErrorKind::InvalidLocationCode(self.location));
        }
        if Unit::from_code(self.metric).is_none() {
            exn::bail!(ErrorKind::InvalidMetricCode(self.metric));
        }
        Ok(())
    }

    /// Shorthand for [`parse`](Self::parse) followed by [`validate`](Self::validate).
    pub fn parse_valid(file_name: impl Into<String>) -> Result<Self> {
        let parsed = Self::parse(file_name)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn document_key(&self) -> DocumentKey {
        DocumentKey(format!("D{}{}{}", self.format, self.location, self.document_number))
    }

    /// First digit of the document number, used by the location rules.
    pub fn leading_digit(&self) -> char {
        self.document_number.chars().next().unwrap_or('0')
    }

    pub fn paper_size(&self) -> Option<PaperSize> {
        PaperSize::from_code(self.format)
    }

    pub fn unit(&self) -> Option<Unit> {
        Unit::from_code(self.metric)
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        // The grammar guarantees a three-letter ASCII extension.
        &self.file_name[..self.file_name.len() - 4]
    }
}
impl FromStr for ParsedName {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_fields() {
        let name = ParsedName::parse("DAM123456R02S01M.tif").unwrap();
        assert_eq!(name.format, 'A');
        assert_eq!(name.location, 'M');
        assert_eq!(name.document_number, "123456");
        assert_eq!(name.revision, Revision::new(2).unwrap());
        assert_eq!(name.sheet, Sheet::new(1).unwrap());
        assert_eq!(name.metric, 'M');
        assert_eq!(name.kind, FileKind::Raster);
        assert_eq!(name.document_key().as_str(), "DAM123456");
        assert_eq!(name.stem(), "DAM123456R02S01M");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let name = ParsedName::parse("dbk654321r10s03i.PDF").unwrap();
        assert_eq!(name.format, 'B');
        assert_eq!(name.location, 'K');
        assert_eq!(name.metric, 'I');
        assert_eq!(name.kind, FileKind::Document);
        assert_eq!(name.revision.to_string(), "10");
        // Original casing is kept for moving the file around.
        assert_eq!(name.file_name, "dbk654321r10s03i.PDF");
        assert_eq!(name.document_key().as_str(), "DBK654321");
    }

    #[rstest]
    #[case("badfile.tif")]
    #[case("DAM12345R01S01M.tif")]
    #[case("DAM123456R1S01M.tif")]
    #[case("DAM123456R01S01M.png")]
    #[case("DAM123456R01S01M.tif.bak")]
    #[case("xDAM123456R01S01M.tif")]
    #[case("DAM123456R01S01MM.tif")]
    fn test_parse_rejects(#[case] file_name: &str) {
        let err = ParsedName::parse(file_name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidName(_)));
    }

    #[rstest]
    #[case("DZM123456R01S01M.tif", ErrorKind::InvalidFormatCode('Z'))]
    #[case("DAX123456R01S01M.tif", ErrorKind::InvalidLocationCode('X'))]
    #[case("DAM123456R01S01Q.tif", ErrorKind::InvalidMetricCode('Q'))]
    // Format is checked before location.
    #[case("DZX123456R01S01Q.tif", ErrorKind::InvalidFormatCode('Z'))]
    fn test_validate(#[case] file_name: &str, #[case] expected: ErrorKind) {
        let name = ParsedName::parse(file_name).unwrap();
        let err = name.validate().unwrap_err();
        assert_eq!(*err, expected);
    }

    #[test]
    fn test_revision_orders_numerically() {
        let nine: Revision = "09".parse().unwrap();
        let ten: Revision = "10".parse().unwrap();
        assert!(nine < ten);
        assert_eq!(nine.to_string(), "09");
        assert!("9".parse::<Revision>().is_err());
        assert!(Revision::new(100).is_none());
    }

    #[test]
    fn test_document_key_prefixes() {
        let key = ParsedName::parse("DAM123456R02S01M.tif").unwrap().document_key();
        assert!(key.prefixes("DAM123456R01S01I.tif"));
        assert!(key.prefixes("dam123456r01s02m.tif"));
        assert!(!key.prefixes("DAM123457R01S01M.tif"));
        assert!(!key.prefixes("DAM12"));
    }
}

use archivist_naming::error::ErrorKind as NamingErrorKind;
use derive_more::Display;

/// Why a file was not archived (or, for [`AlreadySuperseded`](Self::AlreadySuperseded),
/// why one of its siblings went somewhere unexpected).
///
/// The [`Display`] form is the label written to the decision log.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reason {
    #[display("Invalid Name")]
    InvalidName,
    #[display("Invalid Format")]
    InvalidFormatCode,
    #[display("Invalid Location")]
    InvalidLocationCode,
    #[display("Invalid Metric")]
    InvalidMetricCode,
    /// Exact name already archived. Routed to the same-revision area.
    #[display("Same Revision")]
    DuplicateRevision,
    /// A newer revision of the sheet is already archived.
    #[display("Previous Revision")]
    StaleRevision,
    /// A sibling due for history already had a copy there.
    #[display("Already Superseded")]
    AlreadySuperseded,
    #[display("Wrong Orientation")]
    WrongOrientation,
    /// The file could not be moved; it stays where it was.
    #[display("Transfer Failure")]
    TransferFailure,
    #[display("Metadata Write Failure")]
    MetadataWriteFailure,
}
impl From<&NamingErrorKind> for Reason {
    fn from(kind: &NamingErrorKind) -> Self {
        match kind {
            NamingErrorKind::InvalidName(_) => Reason::InvalidName,
            NamingErrorKind::InvalidFormatCode(_) => Reason::InvalidFormatCode,
            NamingErrorKind::InvalidLocationCode(_) => Reason::InvalidLocationCode,
            NamingErrorKind::InvalidMetricCode(_) => Reason::InvalidMetricCode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_naming::ParsedName;
    use rstest::rstest;

    #[rstest]
    #[case("DAM123456R01S01M.jpg", Reason::InvalidName)]
    #[case("DFM123456R01S01M.tif", Reason::InvalidFormatCode)]
    #[case("DAX123456R01S01M.tif", Reason::InvalidLocationCode)]
    #[case("DAM123456R01S01Q.tif", Reason::InvalidMetricCode)]
    fn test_from_naming_error(#[case] name: &str, #[case] expected: Reason) {
        let err = ParsedName::parse_valid(name).unwrap_err();
        assert_eq!(Reason::from(&*err), expected);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Reason::DuplicateRevision.to_string(), "Same Revision");
        assert_eq!(Reason::StaleRevision.to_string(), "Previous Revision");
    }
}

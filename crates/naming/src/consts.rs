use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// D <format> <location> <document number> R <revision> S <sheet> <metric> . <tif|pdf>
regex!(DRAWING_NAME_REGEX, r"(?i)^D(\w)(\w)([0-9]{6})R([0-9]{2})S([0-9]{2})(\w)\.(tif|pdf)$");
// G <4 digits> <3 chars> <7 digits> ISS R <revision> S <sheet> . pdf
regex!(SPEC_SHEET_REGEX, r"(?i)^G([0-9]{4})(\w{3})([0-9]{7})ISSR([0-9]{2})S([0-9]{2})\.pdf$");

/// Extensions (lowercase, without the dot) the archive deals in.
pub const RECOGNIZED_EXTENSIONS: [&str; 2] = ["tif", "pdf"];

/// Business category letters accepted by semantic validation.
pub(crate) const LOCATION_CODES: &str = "MKFTESNP";

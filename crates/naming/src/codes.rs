use std::fmt::{Display, Formatter, Result as FmtResult};

/// Paper size encoded by the format letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperSize {
    /// (A) A4
    A4,
    /// (B) A3
    A3,
    /// (C) A2
    A2,
    /// (D) A1
    A1,
    /// (E) A0
    A0,
}
impl PaperSize {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code.to_ascii_uppercase() {
            'A' => Self::A4,
            'B' => Self::A3,
            'C' => Self::A2,
            'D' => Self::A1,
            'E' => Self::A0,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::A3 => "A3",
            PaperSize::A2 => "A2",
            PaperSize::A1 => "A1",
            PaperSize::A0 => "A0",
        }
    }
}
impl Display for PaperSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Unit system a drawing instance is dimensioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// (M) Metric
    Metric,
    /// (I) Inch
    Inch,
    /// (D) Dual: both unit systems on one sheet
    Dual,
    /// (N) Not applicable
    NotApplicable,
}
impl Unit {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code.to_ascii_uppercase() {
            'M' => Self::Metric,
            'I' => Self::Inch,
            'D' => Self::Dual,
            'N' => Self::NotApplicable,
            _ => return None,
        })
    }

    pub fn code(&self) -> char {
        match self {
            Unit::Metric => 'M',
            Unit::Inch => 'I',
            Unit::Dual => 'D',
            Unit::NotApplicable => 'N',
        }
    }

    /// Dual and not-applicable drawings stand in for every unit system, so a
    /// newer one of those replaces older revisions regardless of their unit.
    pub fn covers_all(&self) -> bool {
        matches!(self, Unit::Dual | Unit::NotApplicable)
    }

    /// The value the downstream importer expects in the `UOM` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Metric => "Metric",
            Unit::Inch => "Inch",
            Unit::Dual => "Dual",
            Unit::NotApplicable => "(Not applicable)",
        }
    }
}
impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('A', Some(PaperSize::A4))]
    #[case('b', Some(PaperSize::A3))]
    #[case('E', Some(PaperSize::A0))]
    #[case('F', None)]
    #[case('1', None)]
    fn test_paper_size(#[case] code: char, #[case] expected: Option<PaperSize>) {
        assert_eq!(PaperSize::from_code(code), expected);
    }

    #[rstest]
    #[case('M', Some(Unit::Metric), "Metric")]
    #[case('i', Some(Unit::Inch), "Inch")]
    #[case('D', Some(Unit::Dual), "Dual")]
    #[case('N', Some(Unit::NotApplicable), "(Not applicable)")]
    #[case('A', None, "")]
    fn test_unit(#[case] code: char, #[case] expected: Option<Unit>, #[case] label: &str) {
        let unit = Unit::from_code(code);
        assert_eq!(unit, expected);
        if let Some(unit) = unit {
            assert_eq!(unit.as_str(), label);
            assert_eq!(unit.code(), code.to_ascii_uppercase());
        }
    }

    #[test]
    fn test_covers_all() {
        assert!(Unit::Dual.covers_all());
        assert!(Unit::NotApplicable.covers_all());
        assert!(!Unit::Metric.covers_all());
        assert!(!Unit::Inch.covers_all());
    }
}

//! The pure half of revision resolution: given a candidate and the names that
//! share its document key in the target directory, decide what happens.
//! Nothing here touches the file system.

use archivist_naming::{ParsedName, Revision};

/// What to do with a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A file with the candidate's exact name is already archived.
    Duplicate { existing: String },
    /// A newer revision of the same sheet is already archived.
    Stale { newer: String },
    /// The candidate goes into the archive.
    Accept(Acceptance),
}

/// Side effects of accepting a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acceptance {
    /// Older revisions of the same sheet to move to history.
    pub supersede: Vec<ParsedName>,
    /// Older revisions of the same sheet left in place because their unit
    /// differs from the candidate's.
    pub metric_kept: Vec<String>,
    /// Same revision and sheet, different unit. Both stay.
    pub metric_mismatch: Vec<String>,
    /// Same document, other sheets. Never touched.
    pub other_sheets: Vec<String>,
}

/// Decides the fate of `candidate` given `names`, the file names in its target
/// directory that start with its document key. Names that don't parse, or
/// that parse to a different document, are ignored.
///
/// Revisions compare numerically. Only siblings on the candidate's own sheet
/// take part in the stale and supersession checks; each sheet has its own
/// revision lineage.
pub fn decide(candidate: &ParsedName, names: &[String]) -> Decision {
    if let Some(existing) = names.iter().find(|name| name.eq_ignore_ascii_case(&candidate.file_name)) {
        return Decision::Duplicate { existing: existing.clone() };
    }

    let key = candidate.document_key();
    let siblings: Vec<ParsedName> = names
        .iter()
        .filter_map(|name| ParsedName::parse(name.as_str()).ok())
        .filter(|sibling| sibling.document_key() == key)
        .collect();
    let (same_sheet, other_sheets): (Vec<_>, Vec<_>) =
        siblings.into_iter().partition(|sibling| sibling.sheet == candidate.sheet);
    let same_rev_sheet: Vec<&ParsedName> =
        same_sheet.iter().filter(|sibling| sibling.revision == candidate.revision).collect();

    // Listing and file system disagreed on the fast path (case differences on
    // a case-sensitive share, or a stale stat). Catch it here too.
    if let Some(existing) = same_rev_sheet.iter().find(|sibling| {
        sibling.metric == candidate.metric && sibling.kind == candidate.kind
    }) {
        return Decision::Duplicate { existing: existing.file_name.clone() };
    }

    let mut acceptance = Acceptance {
        other_sheets: other_sheets.into_iter().map(|sibling| sibling.file_name).collect(),
        ..Acceptance::default()
    };
    let Some(newest) = same_sheet.iter().max_by_key(|sibling| sibling.revision) else {
        return Decision::Accept(acceptance);
    };
    let max_revision: Revision = newest.revision;

    if candidate.revision < max_revision {
        return Decision::Stale { newer: newest.file_name.clone() };
    }
    if candidate.revision == max_revision {
        acceptance.metric_mismatch = same_rev_sheet
            .iter()
            .filter(|sibling| sibling.metric != candidate.metric)
            .map(|sibling| sibling.file_name.clone())
            .collect();
        return Decision::Accept(acceptance);
    }

    // Dual and not-applicable drawings replace every unit; metric and inch
    // drawings only replace their own.
    let covers_all = candidate.unit().is_some_and(|unit| unit.covers_all());
    for sibling in same_sheet.into_iter().filter(|sibling| sibling.revision < candidate.revision) {
        if covers_all || sibling.metric == candidate.metric {
            acceptance.supersede.push(sibling);
        } else {
            acceptance.metric_kept.push(sibling.file_name);
        }
    }
    Decision::Accept(acceptance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn candidate(name: &str) -> ParsedName {
        ParsedName::parse_valid(name).unwrap()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn superseded(decision: &Decision) -> Vec<&str> {
        match decision {
            Decision::Accept(acceptance) => acceptance.supersede.iter().map(|s| s.file_name.as_str()).collect(),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_first_of_its_kind() {
        let decision = decide(&candidate("DAM123456R00S01M.tif"), &[]);
        assert_eq!(decision, Decision::Accept(Acceptance::default()));
    }

    #[test]
    fn test_exact_duplicate() {
        let decision = decide(&candidate("DAM123456R01S01M.tif"), &names(&["dam123456r01s01m.tif"]));
        assert_eq!(decision, Decision::Duplicate { existing: "dam123456r01s01m.tif".to_string() });
    }

    #[test]
    fn test_stale_references_newest() {
        let decision = decide(
            &candidate("DAM123456R02S01M.tif"),
            &names(&["DAM123456R01S01M.tif", "DAM123456R03S01I.tif", "DAM123456R10S01M.tif"]),
        );
        assert_eq!(decision, Decision::Stale { newer: "DAM123456R10S01M.tif".to_string() });
    }

    #[test]
    fn test_revisions_compare_numerically() {
        let decision = decide(&candidate("DAM123456R10S01M.tif"), &names(&["DAM123456R09S01M.tif"]));
        assert_eq!(superseded(&decision), vec!["DAM123456R09S01M.tif"]);
    }

    #[test]
    fn test_new_revision_keeps_other_metric() {
        let decision = decide(
            &candidate("DAM123456R02S01M.tif"),
            &names(&["DAM123456R01S01M.tif", "DAM123456R01S01I.tif"]),
        );
        let Decision::Accept(acceptance) = decision else { panic!("expected acceptance") };
        assert_eq!(acceptance.supersede.len(), 1);
        assert_eq!(acceptance.supersede[0].file_name, "DAM123456R01S01M.tif");
        assert_eq!(acceptance.metric_kept, vec!["DAM123456R01S01I.tif".to_string()]);
        assert!(acceptance.metric_mismatch.is_empty());
    }

    #[rstest]
    #[case::same_metric("DAM123456R02S01M.tif", "DAM123456R01S01M.tif", true)]
    #[case::different_metric("DAM123456R02S01I.tif", "DAM123456R01S01M.tif", false)]
    #[case::dual_covers_metric("DAM123456R02S01D.tif", "DAM123456R01S01M.tif", true)]
    #[case::dual_covers_inch("DAM123456R02S01D.tif", "DAM123456R01S01I.tif", true)]
    #[case::not_applicable_covers("DAM123456R02S01N.tif", "DAM123456R01S01I.tif", true)]
    #[case::metric_does_not_cover_dual("DAM123456R02S01M.tif", "DAM123456R01S01D.tif", false)]
    fn test_metric_rules(#[case] incoming: &str, #[case] existing: &str, #[case] moves: bool) {
        let decision = decide(&candidate(incoming), &names(&[existing]));
        assert_eq!(superseded(&decision).contains(&existing), moves);
    }

    #[test]
    fn test_every_older_same_metric_revision_moves() {
        let decision = decide(
            &candidate("DAM123456R05S01M.tif"),
            &names(&["DAM123456R01S01M.tif", "DAM123456R02S01M.pdf", "DAM123456R04S01M.tif"]),
        );
        assert_eq!(
            superseded(&decision),
            vec!["DAM123456R01S01M.tif", "DAM123456R02S01M.pdf", "DAM123456R04S01M.tif"]
        );
    }

    #[test]
    fn test_other_sheets_never_move() {
        let decision = decide(
            &candidate("DAM123456R02S01M.tif"),
            &names(&["DAM123456R01S02M.tif", "DAM123456R05S03M.tif"]),
        );
        let Decision::Accept(acceptance) = decision else { panic!("expected acceptance") };
        assert!(acceptance.supersede.is_empty());
        assert_eq!(acceptance.other_sheets, names(&["DAM123456R01S02M.tif", "DAM123456R05S03M.tif"]));
    }

    #[test]
    fn test_equal_revision_other_metric_coexists() {
        let decision = decide(
            &candidate("DAM123456R02S01I.tif"),
            &names(&["DAM123456R01S01M.tif", "DAM123456R02S01M.tif"]),
        );
        let Decision::Accept(acceptance) = decision else { panic!("expected acceptance") };
        assert!(acceptance.supersede.is_empty());
        assert!(acceptance.metric_kept.is_empty());
        assert_eq!(acceptance.metric_mismatch, names(&["DAM123456R02S01M.tif"]));
    }

    #[test]
    fn test_equal_revision_same_metric_other_kind() {
        let decision = decide(&candidate("DAM123456R02S01M.pdf"), &names(&["DAM123456R02S01M.tif"]));
        let Decision::Accept(acceptance) = decision else { panic!("expected acceptance") };
        assert!(acceptance.supersede.is_empty());
        assert!(acceptance.metric_mismatch.is_empty());
    }

    #[test]
    fn test_ignores_unrelated_names() {
        let decision = decide(
            &candidate("DAM123456R02S01M.tif"),
            &names(&["DAM1234567R01S01M.tif", "DAM123456R01S01M.tif.bak", "DAM123456R03S01M_old.tif"]),
        );
        assert_eq!(decision, Decision::Accept(Acceptance::default()));
    }
}

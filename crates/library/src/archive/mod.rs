//! One archive pass over the landing directory.
//!
//! [`archive`] normalizes extensions, enumerates the candidates and resolves
//! them on a bounded pool of `ctx.workers` concurrent tasks, streaming an
//! [`ArchiveEvent`] per file. A failure on one file never stops the pass.

mod stream;

pub use self::stream::{ArchiveEvent, archive};
use crate::error::Result;
use crate::{Context, Outcome, Reason};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::pin::pin;
use std::time::Duration;

/// Totals for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Candidate files found in the landing directory.
    pub seen: usize,
    pub archived: usize,
    /// Older revisions moved to history.
    pub superseded: usize,
    /// Files routed to a holding area, by reason. Siblings that were
    /// already in history count under [`Reason::AlreadySuperseded`].
    pub rejected: BTreeMap<Reason, usize>,
    /// Files left in the landing directory.
    pub failed: usize,
    pub elapsed: Duration,
}
impl PassReport {
    pub(crate) fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Archived { superseded, already_superseded, .. } => {
                self.archived += 1;
                self.superseded += superseded.len();
                if !already_superseded.is_empty() {
                    *self.rejected.entry(Reason::AlreadySuperseded).or_default() += already_superseded.len();
                }
            },
            Outcome::Rejected { reason, .. } => *self.rejected.entry(*reason).or_default() += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Whether the pass found anything to do.
    pub fn did_work(&self) -> bool {
        self.seen > 0
    }
}

/// Runs one pass to completion and returns its report.
///
/// # Errors
/// Only if the landing directory itself can't be read.
pub async fn archive_once(ctx: &Context) -> Result<PassReport> {
    let mut events = pin!(archive(ctx));
    let mut report = PassReport::default();
    while let Some(event) = events.next().await {
        if let ArchiveEvent::Complete(complete) = event? {
            report = complete;
        }
    }
    Ok(report)
}

//! The decision log.
//!
//! One plain-text line per decision, `name # label # process # sibling`,
//! appended to a monthly file (`archivist_Oct.2026.log`). The file is read by
//! people and by the audit display, so labels are stable strings. Every line
//! is mirrored to `tracing` as well.
//!
//! Writing the log is best-effort: a failed append is reported through
//! `tracing` and never changes what happens to the file being processed.

use crate::Reason;
use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// What happened to an accepted file or one of its siblings.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Process {
    /// The candidate is in the archive.
    #[display("Archived")]
    Archived,
    /// An older revision with the same unit went to history.
    #[display("New Revision")]
    NewRevision,
    /// An older revision with a different unit went to history because the
    /// candidate is dual or unit-less.
    #[display("Metric Change")]
    MetricChange,
    /// An older revision with a different unit stayed put.
    #[display("Metric Kept")]
    MetricKept,
    /// Same revision and sheet already archived in another unit.
    #[display("Metric Mismatch")]
    MetricMismatch,
    /// Same document, different sheet. Informational.
    #[display("Different Sheet")]
    DifferentSheet,
}

/// Append-only decision log.
#[derive(Debug)]
pub struct Journal {
    dir: PathBuf,
    // Serializes appends so lines from concurrent workers never interleave.
    lock: Mutex<()>,
}
impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file this month's records go to.
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(file_name(now()))
    }

    /// Records a step in archiving `file` (label is the location category).
    pub async fn processed(&self, file: &str, label: &str, process: Process, sibling: Option<&str>) {
        let line = format!("{file} # {label} # {process} # {}", sibling.unwrap_or_default());
        tracing::info!(file, label, %process, sibling, "{line}");
        self.append(&line).await;
    }

    /// Records a problem with `file`; `routing` says where it went.
    pub async fn anomaly(&self, file: &str, reason: Reason, routing: &str, sibling: Option<&str>) {
        let line = format!("{file} # {reason} # {routing} # {}", sibling.unwrap_or_default());
        tracing::error!(file, %reason, routing, sibling, "{line}");
        self.append(&line).await;
    }

    /// Closes a pass that did some work.
    pub async fn process_time(&self, elapsed: Duration) {
        let line = format!("ProcessTime # {:.2}s", elapsed.as_secs_f64());
        tracing::info!(elapsed = ?elapsed, "{line}");
        self.append(&line).await;
    }

    async fn append(&self, line: &str) {
        if let Err(e) = self.try_append(line).await {
            tracing::warn!(dir = %self.dir.display(), error = ?e, "Could not write decision log");
        }
    }

    async fn try_append(&self, line: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await.or_raise(|| ErrorKind::Journal)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())
            .await
            .or_raise(|| ErrorKind::Journal)?;
        file.write_all(format!("{line}\n").as_bytes()).await.or_raise(|| ErrorKind::Journal)?;
        file.flush().await.or_raise(|| ErrorKind::Journal)?;
        Ok(())
    }
}

/// Local time, or UTC where the local offset can't be determined safely.
pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn file_name(at: OffsetDateTime) -> String {
    let month = at.format(format_description!("[month repr:short].[year]")).unwrap_or_default();
    format!("archivist_{month}.log")
}

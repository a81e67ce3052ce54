//! Revision resolution for one landing file.
//!
//! [`process_file`] is the per-file boundary: whatever happens inside, it
//! returns an [`Outcome`] and never an error. The read-decide-move sequence
//! against the target archive directory runs under that directory's document
//! lock; staging, the side-file and most of the logging happen after the
//! lock is released.

mod decision;

pub use self::decision::{Acceptance, Decision, decide};
use crate::error::{ErrorKind, Result};
use crate::journal::Process;
use crate::sidecar::{self, Fields};
use crate::{Context, Reason, orientation};
use archivist_naming::{FileKind, LocationInfo, ParsedName, resolve};
use archivist_storage::ListingCache;
use archivist_storage::error::ErrorKind as StorageErrorKind;
use exn::ResultExt;
use std::path::{Path, PathBuf};

/// What happened to one landing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Archived {
        file: String,
        /// Where it now lives in the archive.
        path: PathBuf,
        /// Older revisions moved to history.
        superseded: Vec<String>,
        /// Older revisions sent to the error area because history already
        /// had them.
        already_superseded: Vec<String>,
        /// Problems after archiving (staging, side-file). The file stays archived.
        warnings: Vec<Reason>,
    },
    /// Moved to the error or same-revision area.
    Rejected { file: String, reason: Reason, moved_to: PathBuf },
    /// Left in the landing directory.
    Failed { file: String, reason: Reason },
}
impl Outcome {
    pub fn file(&self) -> &str {
        match self {
            Outcome::Archived { file, .. } | Outcome::Rejected { file, .. } | Outcome::Failed { file, .. } => file,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Holding {
    Errors,
    SameRevision,
}
impl Holding {
    fn dir(self, ctx: &Context) -> &Path {
        match self {
            Holding::Errors => &ctx.paths.errors,
            Holding::SameRevision => &ctx.paths.same_revision,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Holding::Errors => "Errors",
            Holding::SameRevision => "Same Revision",
        }
    }
}

const LEFT_IN_PLACE: &str = "Left In Place";
const STAGING: &str = "Staging";

/// Resolves and routes the landing file at `path`.
///
/// `listings` must be shared by every call in the same pass.
#[tracing::instrument(skip_all, fields(file = %path.display()))]
pub async fn process_file(ctx: &Context, listings: &ListingCache, path: &Path) -> Outcome {
    let file = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    match process_file_inner(ctx, listings, path, &file).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = ?e, "Could not process file; left in place");
            ctx.journal.anomaly(&file, Reason::TransferFailure, LEFT_IN_PLACE, None).await;
            Outcome::Failed { file, reason: Reason::TransferFailure }
        },
    }
}

async fn process_file_inner(ctx: &Context, listings: &ListingCache, path: &Path, file: &str) -> Result<Outcome> {
    let name = match ParsedName::parse_valid(file) {
        Ok(name) => name,
        Err(e) => return Ok(reject(ctx, path, file, Reason::from(&*e), None, Holding::Errors).await),
    };
    let location = resolve(&name, &ctx.paths.archive);
    let dir = location.directory.as_path();
    let key = name.document_key();

    let guard = ctx.locks.acquire(dir, &key).await;

    // Stat the real directory; the listing could be stale if someone else
    // wrote to the archive during the pass.
    if tokio::fs::try_exists(dir.join(file)).await.unwrap_or(false) {
        return Ok(reject(ctx, path, file, Reason::DuplicateRevision, Some(file), Holding::SameRevision).await);
    }
    let listing = listings.ensure(dir).await.or_raise(|| ErrorKind::Storage)?;
    let names = listing.filter(|candidate| key.prefixes(candidate));
    let acceptance = match decide(&name, &names) {
        Decision::Duplicate { existing } => {
            return Ok(reject(ctx, path, file, Reason::DuplicateRevision, Some(&existing), Holding::SameRevision).await);
        },
        Decision::Stale { newer } => {
            return Ok(reject(ctx, path, file, Reason::StaleRevision, Some(&newer), Holding::Errors).await);
        },
        Decision::Accept(acceptance) => acceptance,
    };

    // Before anything moves: a sideways scan must not push the current
    // revision into history.
    if name.kind == FileKind::Raster && !orientation::check(&ctx.orientation, path).await.is_acceptable() {
        return Ok(reject(ctx, path, file, Reason::WrongOrientation, None, Holding::Errors).await);
    }

    let label = location.label();
    for (process, siblings) in [
        (Process::DifferentSheet, &acceptance.other_sheets),
        (Process::MetricMismatch, &acceptance.metric_mismatch),
        (Process::MetricKept, &acceptance.metric_kept),
    ] {
        for sibling in siblings {
            ctx.journal.processed(file, label, process, Some(sibling)).await;
        }
    }

    let mut superseded = Vec::new();
    let mut already_superseded = Vec::new();
    for sibling in acceptance.supersede {
        let result = supersede(ctx, listings, &name, &location, &sibling).await?;
        match result {
            Superseded::ToHistory => superseded.push(sibling.file_name),
            Superseded::AlreadyInHistory => already_superseded.push(sibling.file_name),
            Superseded::Gone => {},
        }
    }

    let archived = ctx.transfer.move_to(path, dir).await.or_raise(|| ErrorKind::Storage)?;
    listings.add(dir, file);
    drop(guard);

    let warnings = stage(ctx, &name, &location, &archived.path).await;
    ctx.journal.processed(file, label, Process::Archived, None).await;
    Ok(Outcome::Archived { file: file.to_string(), path: archived.path, superseded, already_superseded, warnings })
}

enum Superseded {
    ToHistory,
    AlreadyInHistory,
    /// Listed but no longer on disk.
    Gone,
}

/// Moves `sibling` out of the way of `candidate`: into
/// `<history>/<sibling format letter>/`, or into the error area if history
/// already holds a file of that name.
async fn supersede(
    ctx: &Context,
    listings: &ListingCache,
    candidate: &ParsedName,
    location: &LocationInfo,
    sibling: &ParsedName,
) -> Result<Superseded> {
    let dir = location.directory.as_path();
    let source = dir.join(&sibling.file_name);
    let history = ctx.paths.history.join(sibling.format.to_string());

    if tokio::fs::try_exists(history.join(&sibling.file_name)).await.unwrap_or(false) {
        ctx.transfer.move_to(&source, &ctx.paths.errors).await.or_raise(|| ErrorKind::Storage)?;
        listings.remove(dir, &sibling.file_name);
        ctx.journal
            .anomaly(&sibling.file_name, Reason::AlreadySuperseded, Holding::Errors.label(), Some(&candidate.file_name))
            .await;
        return Ok(Superseded::AlreadyInHistory);
    }

    match ctx.transfer.move_to(&source, &history).await {
        Ok(_) => {},
        Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => {
            tracing::warn!(sibling = %sibling.file_name, "Sibling vanished before it could be superseded");
            listings.remove(dir, &sibling.file_name);
            return Ok(Superseded::Gone);
        },
        Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
    }
    listings.remove(dir, &sibling.file_name);
    let process = if sibling.metric == candidate.metric { Process::NewRevision } else { Process::MetricChange };
    ctx.journal.processed(&candidate.file_name, location.label(), process, Some(&sibling.file_name)).await;
    Ok(Superseded::ToHistory)
}

/// Mirrors an archived file into the staging area and writes its side-file.
async fn stage(ctx: &Context, name: &ParsedName, location: &LocationInfo, archived: &Path) -> Vec<Reason> {
    let file = name.file_name.as_str();
    if let Err(e) = ctx.transfer.copy_or_link_to(archived, &ctx.paths.staging.join(file)).await {
        tracing::error!(error = ?e, "Could not stage archived file");
        ctx.journal.anomaly(file, Reason::TransferFailure, STAGING, None).await;
        return vec![Reason::TransferFailure];
    }
    if let Err(e) = sidecar::write(&ctx.paths.staging, &Fields::for_drawing(name, location), &ctx.metadata).await {
        tracing::error!(error = ?e, "Could not write metadata side-file");
        ctx.journal.anomaly(file, Reason::MetadataWriteFailure, STAGING, None).await;
        return vec![Reason::MetadataWriteFailure];
    }
    Vec::new()
}

/// Moves a rejected file to its holding area. If even that fails, the file
/// stays where it is.
async fn reject(
    ctx: &Context,
    path: &Path,
    file: &str,
    reason: Reason,
    sibling: Option<&str>,
    holding: Holding,
) -> Outcome {
    match ctx.transfer.move_to(path, holding.dir(ctx)).await {
        Ok(moved) => {
            ctx.journal.anomaly(file, reason, holding.label(), sibling).await;
            Outcome::Rejected { file: file.to_string(), reason, moved_to: moved.path }
        },
        Err(e) => {
            tracing::error!(error = ?e, %reason, "Could not route rejected file; left in place");
            ctx.journal.anomaly(file, reason, LEFT_IN_PLACE, sibling).await;
            Outcome::Failed { file: file.to_string(), reason: Reason::TransferFailure }
        },
    }
}

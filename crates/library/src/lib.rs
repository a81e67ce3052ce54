//! Drawing intake: resolves each file in the landing directory against the
//! archive and routes it.
//!
//! The entry points are [`archive`] (a stream of [`ArchiveEvent`]s) and
//! [`archive_once`] (drives the stream to completion). Both take a
//! [`Context`], which owns everything shared between the workers of a pass
//! except the directory listings, which are fresh for every pass.

pub mod archive;
pub mod error;
pub mod journal;
pub mod orientation;
mod reason;
pub mod resolve;
pub mod sidecar;

pub use crate::archive::{ArchiveEvent, PassReport, archive, archive_once};
pub use crate::journal::Journal;
pub use crate::orientation::{OrientationCheck, TiffHeader};
pub use crate::reason::Reason;
pub use crate::resolve::{Outcome, process_file};
use archivist_config::{Config, Metadata, Paths};
use archivist_storage::{DocumentLocks, Transfer};
use std::sync::Arc;

pub struct Context {
    pub paths: Paths,
    pub accept_pdf: bool,
    /// Worker pool width.
    pub workers: usize,
    pub metadata: Metadata,
    pub transfer: Transfer,
    pub orientation: Arc<dyn OrientationCheck>,
    pub(crate) locks: DocumentLocks,
    pub(crate) journal: Journal,
}
impl Context {
    /// Context for `config`, looking up the bulk-copy utility on `PATH`.
    pub fn new(config: &Config) -> Self {
        Self::with_transfer(config, Transfer::discover(config.transfer.clone()))
    }

    pub fn with_transfer(config: &Config, transfer: Transfer) -> Self {
        let journal_dir = config.paths.logs.clone().unwrap_or_else(|| config.paths.landing.clone());
        Self {
            paths: config.paths.clone(),
            accept_pdf: config.accept_pdf,
            workers: config.workers.max(1),
            metadata: config.metadata.clone(),
            transfer,
            orientation: Arc::new(TiffHeader),
            locks: DocumentLocks::new(),
            journal: Journal::new(journal_dir),
        }
    }

    /// Replaces the orientation check (the TIFF header reader by default).
    pub fn with_orientation(mut self, check: impl OrientationCheck + 'static) -> Self {
        self.orientation = Arc::new(check);
        self
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

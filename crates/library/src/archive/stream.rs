use crate::archive::PassReport;
use crate::error::{ErrorKind, Result};
use crate::{Context, Outcome, process_file};
use archivist_storage::{ListingCache, candidates, count_drawings, normalize_extensions};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::path::Path;
use std::time::Instant;

/// Progress events emitted by [`archive`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete), exactly once, with the
///    number of candidate files.
/// 3. [`Processed`](Self::Processed), once per candidate, in completion order.
/// 4. [`Complete`](Self::Complete), exactly once, with the pass totals.
///
/// If the landing directory can't be read the stream yields one `Err` and
/// ends without [`Complete`](Self::Complete).
#[derive(Debug)]
pub enum ArchiveEvent {
    Started,
    DiscoveryComplete(u64),
    Processed(Outcome),
    Complete(PassReport),
}

/// Streams one archive pass over `ctx.paths.landing`.
pub fn archive(ctx: &Context) -> impl Stream<Item = Result<ArchiveEvent>> + '_ {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let started = Instant::now();
        yield Ok(ArchiveEvent::Started);

        let landing = ctx.paths.landing.as_path();
        let files = match discover(landing, ctx.accept_pdf).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(ArchiveEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(0)));

        let mut report = PassReport { seen: files.len(), ..PassReport::default() };
        // Listings are only trusted for the length of one pass.
        let listings = ListingCache::new();
        let mut futures: Vec<_> = files.iter().map(|path| process_file(ctx, &listings, path)).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(futures.drain(..ctx.workers.max(1).min(futures.len())));
        while let Some(outcome) = processing.next().await {
            report.record(&outcome);
            yield Ok(ArchiveEvent::Processed(outcome));
            // Pop-n-push, but FIFO instead of LIFO.
            if !futures.is_empty() {
                processing.push(futures.remove(0));
            }
        }

        report.elapsed = started.elapsed();
        if report.did_work() {
            ctx.journal.process_time(report.elapsed).await;
        }
        log_queues(ctx).await;
        tracing::debug!(directories = listings.enumerations(), "Archive pass finished");
        yield Ok(ArchiveEvent::Complete(report));
    })
}

async fn discover(landing: &Path, accept_pdf: bool) -> Result<Vec<std::path::PathBuf>> {
    let renamed = normalize_extensions(landing).await.or_raise(|| ErrorKind::Landing)?;
    if renamed > 0 {
        tracing::debug!(renamed, "Normalized landing file extensions");
    }
    candidates(landing, accept_pdf).await.or_raise(|| ErrorKind::Landing)
}

/// Logs how many files sit in the holding areas waiting for a human.
async fn log_queues(ctx: &Context) {
    for (queue, dir) in [("errors", &ctx.paths.errors), ("same_revision", &ctx.paths.same_revision)] {
        match count_drawings(dir).await {
            Ok(count) => tracing::debug!(queue, count, "Holding area"),
            Err(e) => tracing::debug!(queue, error = ?e, "Could not count holding area"),
        }
    }
}

use archivist_config::Config;
use archivist_library::{Context, PassReport, archive_once};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Archives plotter output: validates drawing names, resolves revisions
/// against the archive and routes every file in the landing directory.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (TOML, JSON or YAML). Defaults to `archivist.toml` in the
    /// per-user config directory, if present.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = ?e, "Could not load configuration");
            return ExitCode::FAILURE;
        },
    };
    let ctx = Context::new(&config);
    match archive_once(&ctx).await {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = ?e, landing = %config.paths.landing.display(), "Archive pass failed");
            ExitCode::FAILURE
        },
    }
}

fn print_summary(report: &PassReport) {
    if !report.did_work() {
        println!("Nothing to archive.");
        return;
    }
    println!(
        "{} file(s) in {:.2}s: {} archived, {} superseded, {} left in place",
        report.seen,
        report.elapsed.as_secs_f64(),
        report.archived,
        report.superseded,
        report.failed,
    );
    for (reason, count) in &report.rejected {
        println!("  {reason}: {count}");
    }
}

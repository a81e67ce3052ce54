//! Layered configuration.
//!
//! Built-in defaults, then a config file (TOML, JSON or YAML, picked by
//! extension), then `ARCHIVIST_*` environment variables with nested keys
//! separated by `__`, e.g. `ARCHIVIST_PATHS__LANDING=/mnt/plotter`.

pub mod error;

use crate::error::{ErrorKind, Result};
use archivist_storage::BulkCopySettings;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "ARCHIVIST_";
const MAX_WORKERS: usize = 16;

/// Validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub paths: Paths,
    /// Pick up `.pdf` files from the landing directory, not just `.tif`.
    pub accept_pdf: bool,
    /// Worker pool width, always within `1..=16`.
    pub workers: usize,
    pub transfer: BulkCopySettings,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub landing: PathBuf,
    pub archive: PathBuf,
    pub errors: PathBuf,
    pub same_revision: PathBuf,
    pub history: PathBuf,
    pub staging: PathBuf,
    pub logs: Option<PathBuf>,
}

/// Constants written into every metadata side-file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub server_name: String,
    pub project_name: String,
    pub oem: String,
    pub design_center: String,
    pub entered_by: String,
}
impl Default for Metadata {
    fn default() -> Self {
        Self {
            server_name: "ORMDB33".to_string(),
            project_name: "FPD Engineering".to_string(),
            oem: "Flowserve".to_string(),
            design_center: "Desio, Italy".to_string(),
            entered_by: "10150286".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    landing: Option<PathBuf>,
    archive: Option<PathBuf>,
    errors: Option<PathBuf>,
    same_revision: Option<PathBuf>,
    history: Option<PathBuf>,
    staging: Option<PathBuf>,
    logs: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawTransfer {
    program: String,
    retries: u32,
    wait_secs: u32,
    unbuffered_threshold: u64,
    success_below: i32,
}
impl Default for RawTransfer {
    fn default() -> Self {
        let defaults = BulkCopySettings::default();
        Self {
            program: defaults.program,
            retries: defaults.retries,
            wait_secs: defaults.wait_secs,
            unbuffered_threshold: defaults.unbuffered_threshold,
            success_below: defaults.success_below,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    paths: RawPaths,
    accept_pdf: bool,
    workers: usize,
    transfer: RawTransfer,
    metadata: Metadata,
}
impl Default for RawConfig {
    fn default() -> Self {
        Self {
            paths: RawPaths::default(),
            accept_pdf: true,
            workers: 4,
            transfer: RawTransfer::default(),
            metadata: Metadata::default(),
        }
    }
}

impl Config {
    /// Where the config file lives when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "archivist").map(|dirs| dirs.config_dir().join("archivist.toml"))
    }

    /// Loads from `path`, or from [`default_path`](Self::default_path) if that
    /// file exists, plus the environment.
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = merge_file(figment, path)?,
            None => {
                if let Some(default) = Self::default_path().filter(|p| p.is_file()) {
                    tracing::debug!(path = %default.display(), "Using default config file");
                    figment = merge_file(figment, &default)?;
                }
            },
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let raw: RawConfig = figment.extract().or_raise(|| ErrorKind::Parse)?;
        raw.validate()
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

fn required(value: Option<PathBuf>, key: &'static str) -> Result<PathBuf> {
    match value {
        Some(path) if !path.as_os_str().is_empty() => Ok(path),
        _ => exn::bail!(ErrorKind::Missing(key)),
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config> {
        let paths = Paths {
            landing: required(self.paths.landing, "paths.landing")?,
            archive: required(self.paths.archive, "paths.archive")?,
            errors: required(self.paths.errors, "paths.errors")?,
            same_revision: required(self.paths.same_revision, "paths.same_revision")?,
            history: required(self.paths.history, "paths.history")?,
            staging: required(self.paths.staging, "paths.staging")?,
            logs: self.paths.logs.filter(|p| !p.as_os_str().is_empty()),
        };
        let transfer = self.transfer;
        if transfer.program.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { key: "transfer.program", reason: "must not be empty".to_string() });
        }
        if transfer.success_below < 1 {
            exn::bail!(ErrorKind::Invalid {
                key: "transfer.success_below",
                reason: format!("{} would treat every exit code as failure", transfer.success_below),
            });
        }
        let workers = self.workers.clamp(1, MAX_WORKERS);
        if workers != self.workers {
            tracing::warn!(requested = self.workers, using = workers, "Worker count out of range");
        }
        Ok(Config {
            paths,
            accept_pdf: self.accept_pdf,
            workers,
            transfer: BulkCopySettings {
                program: transfer.program,
                retries: transfer.retries,
                wait_secs: transfer.wait_secs,
                unbuffered_threshold: transfer.unbuffered_threshold,
                success_below: transfer.success_below,
            },
            metadata: self.metadata,
        })
    }
}

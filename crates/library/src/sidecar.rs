//! Metadata side-files (`.DESEDI`) for the downstream document importer.
//!
//! A side-file is written next to the file in the staging area, once. If one
//! already exists it is left exactly as it is, so writing is idempotent.

use crate::error::{ErrorKind, Result};
use archivist_config::Metadata;
use archivist_naming::location::DocumentType;
use archivist_naming::{LocationInfo, ParsedName, SpecSheetName, Unit};
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

pub const EXTENSION: &str = "DESEDI";

/// Per-file fields of a side-file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pub document_no: String,
    pub revision: String,
    pub sheet: String,
    pub description: String,
    pub actual_size: &'static str,
    pub uom: &'static str,
    pub document_type: DocumentType,
    pub language: &'static str,
    pub file_name: String,
    pub file_type: &'static str,
}
impl Fields {
    pub fn for_drawing(name: &ParsedName, location: &LocationInfo) -> Self {
        Self {
            document_no: name.document_key().to_string(),
            revision: name.revision.to_string(),
            sheet: name.sheet.to_string(),
            description: String::new(),
            actual_size: name.paper_size().map(|size| size.as_str()).unwrap_or("A4"),
            uom: name.unit().unwrap_or(Unit::Metric).as_str(),
            document_type: location.document_type(),
            language: location.language(),
            file_name: name.file_name.clone(),
            file_type: name.kind.as_str(),
        }
    }

    /// Fields for an impeller specification sheet. Spec sheets are not
    /// archived by a pass; this is the entry point for the loader that feeds
    /// them to the importer separately.
    pub fn for_spec_sheet(name: &SpecSheetName) -> Self {
        Self {
            document_no: name.document_number.clone(),
            revision: name.revision.to_string(),
            sheet: name.sheet.to_string(),
            description: " Impeller Specification Sheet".to_string(),
            actual_size: "A4",
            uom: Unit::Metric.as_str(),
            document_type: DocumentType::Detail,
            language: "English",
            file_name: name.file_name.clone(),
            file_type: "Pdf",
        }
    }

    /// Side-file body. `now` is the `Currentdate` value.
    pub fn render(&self, constants: &Metadata, now: &str) -> String {
        let drawing_info_type = match self.document_type {
            DocumentType::Detail => "Detail",
            _ => "Customer Drawings",
        };
        let lines = [
            "[Database]".to_string(),
            format!("ServerName={}", constants.server_name),
            format!("ProjectName={}", constants.project_name),
            "[DatabaseFields]".to_string(),
            format!("DocumentNo={}", self.document_no),
            format!("DocumentRev={}", self.revision),
            format!("SheetNumber={}", self.sheet),
            format!("Description={}", self.description),
            format!("ActualSize={}", self.actual_size),
            "PumpModel=(UNKNOWN)".to_string(),
            format!("OEM={}", constants.oem),
            "PumpSize=".to_string(),
            "OrderNumber=".to_string(),
            "SerialNumber=".to_string(),
            format!("Document_Type={}", self.document_type),
            "DrawingClass=COMMERCIAL".to_string(),
            format!("DesignCenter={}", constants.design_center),
            format!("OEMSite={}", constants.design_center),
            "OEMDrawingNumber=".to_string(),
            format!("UOM={}", self.uom),
            format!("DWGLanguage={}", self.language),
            "CurrentRevision=Y".to_string(),
            format!("EnteredBy={}", constants.entered_by),
            "Notes=".to_string(),
            "NonEnglishDesc=".to_string(),
            "SupersededBy=".to_string(),
            "NumberOfStages=".to_string(),
            "[DrawingInfo]".to_string(),
            format!("DocumentNo={}", self.document_no),
            format!("SheetNumber={}", self.sheet),
            format!("Document_Type={drawing_info_type}"),
            format!("DocumentRev={}", self.revision),
            format!("FileName={}", self.file_name),
            format!("FileType={}", self.file_type),
            format!("Currentdate={now}"),
        ];
        let mut body = lines.join("\n");
        body.push('\n');
        body
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    Created(PathBuf),
    /// A side-file was already there and was left alone.
    Existing(PathBuf),
}

/// Path of the side-file for `file_name` in `dir`.
pub fn path_for(dir: &Path, file_name: &str) -> PathBuf {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    dir.join(format!("{stem}.{EXTENSION}"))
}

/// Writes the side-file for `fields` into `dir` unless one already exists.
pub async fn write(dir: &Path, fields: &Fields, constants: &Metadata) -> Result<Written> {
    let path = path_for(dir, &fields.file_name);
    tokio::fs::create_dir_all(dir).await.or_raise(|| ErrorKind::Sidecar)?;
    // `create_new` makes the existence check and the creation one step, so two
    // writers can't both decide the file is missing.
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
            // Something that isn't a file can't stand in for the side-file.
            if tokio::fs::metadata(&path).await.is_ok_and(|meta| meta.is_file()) {
                return Ok(Written::Existing(path));
            }
            return Err(e).or_raise(|| ErrorKind::Sidecar);
        },
        Err(e) => return Err(e).or_raise(|| ErrorKind::Sidecar),
    };
    let now = crate::journal::now()
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .or_raise(|| ErrorKind::Sidecar)?;
    file.write_all(fields.render(constants, &now).as_bytes()).await.or_raise(|| ErrorKind::Sidecar)?;
    file.flush().await.or_raise(|| ErrorKind::Sidecar)?;
    tracing::debug!(path = %path.display(), "Wrote metadata side-file");
    Ok(Written::Created(path))
}

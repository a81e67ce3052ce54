use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Knobs for the external bulk-copy utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCopySettings {
    /// Program name (looked up on `PATH`) or absolute path.
    pub program: String,
    pub retries: u32,
    pub wait_secs: u32,
    /// Files at least this big are copied with unbuffered I/O.
    pub unbuffered_threshold: u64,
    /// Exit codes strictly below this are success.
    pub success_below: i32,
}
impl Default for BulkCopySettings {
    fn default() -> Self {
        Self {
            program: "robocopy".to_string(),
            retries: 1,
            wait_secs: 1,
            unbuffered_threshold: 256 * 1024 * 1024,
            // Robocopy exit codes are a bitmask; 8 and up means something failed.
            success_below: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Copy,
    /// Copy, then delete the source.
    Move,
}

/// A located bulk-copy executable.
#[derive(Debug, Clone)]
pub struct BulkCopy {
    program: PathBuf,
    settings: BulkCopySettings,
}
impl BulkCopy {
    /// Finds the configured program on `PATH`.
    pub fn discover(settings: BulkCopySettings) -> Option<Self> {
        match which::which(&settings.program) {
            Ok(program) => {
                tracing::debug!(program = %program.display(), "Discovered bulk copy utility");
                Some(Self { program, settings })
            },
            Err(_) => {
                tracing::info!(program = %settings.program, "Bulk copy utility not found in PATH; cross-volume transfers will copy in-process");
                None
            },
        }
    }

    /// Uses `program` as-is, without looking it up.
    pub fn with_program(program: impl Into<PathBuf>, settings: BulkCopySettings) -> Self {
        Self { program: program.into(), settings }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command line for transferring `src` into `dst_dir`:
    /// `<src dir> <dst dir> <file> /COPY:D /R:n /W:n /NJH /NJS /NP /NFL /NDL [/MOV] [/J]`.
    pub fn arguments(&self, src: &Path, dst_dir: &Path, size: u64, mode: Mode) -> Result<Vec<OsString>> {
        let Some(file_name) = src.file_name() else {
            exn::bail!(ErrorKind::InvalidPath(src.to_path_buf()));
        };
        let src_dir = match src.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut args: Vec<OsString> = vec![src_dir.into(), dst_dir.into(), file_name.into()];
        // Data only (no ACLs, owner or audit info), small retry budget, and no
        // job header/summary/progress/file/dir chatter.
        args.push("/COPY:D".into());
        args.push(format!("/R:{}", self.settings.retries).into());
        args.push(format!("/W:{}", self.settings.wait_secs).into());
        args.extend(["/NJH", "/NJS", "/NP", "/NFL", "/NDL"].map(OsString::from));
        if mode == Mode::Move {
            args.push("/MOV".into());
        }
        if size >= self.settings.unbuffered_threshold {
            args.push("/J".into());
        }
        Ok(args)
    }

    /// Runs the utility and classifies its exit code.
    pub async fn run(&self, src: &Path, dst_dir: &Path, mode: Mode) -> Result<()> {
        let size = tokio::fs::metadata(src).await.map_err(|e| ErrorKind::from_io(e, src))?.len();
        let args = self.arguments(src, dst_dir, size, mode)?;
        tracing::debug!(program = %self.program.display(), ?args, "Running bulk copy");
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .or_raise(|| ErrorKind::BulkCopyLaunch(self.program.clone()))?;
        match output.status.code() {
            Some(code) if code < self.settings.success_below => Ok(()),
            code => {
                tracing::warn!(
                    src = %src.display(),
                    dst = %dst_dir.display(),
                    ?code,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Bulk copy failed"
                );
                exn::bail!(ErrorKind::BulkCopyFailed(code))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk() -> BulkCopy {
        BulkCopy::with_program("robocopy", BulkCopySettings { unbuffered_threshold: 100, ..Default::default() })
    }

    #[test]
    fn test_move_arguments() {
        let args = bulk().arguments(Path::new("/plotter/DAM1.tif"), Path::new("/archive/Am"), 10, Mode::Move).unwrap();
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["/plotter", "/archive/Am", "DAM1.tif", "/COPY:D", "/R:1", "/W:1", "/NJH", "/NJS", "/NP", "/NFL", "/NDL", "/MOV"]
        );
    }

    #[test]
    fn test_large_copy_arguments() {
        let args = bulk().arguments(Path::new("DAM1.tif"), Path::new("/staging"), 100, Mode::Copy).unwrap();
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[0], ".");
        assert!(!args.contains(&"/MOV".to_string()));
        assert_eq!(args.last().unwrap(), "/J");
    }

    #[test]
    fn test_arguments_need_file_name() {
        assert!(bulk().arguments(Path::new("/"), Path::new("/staging"), 1, Mode::Copy).is_err());
    }

    #[cfg(unix)]
    fn fake_program(dir: &Path, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(format!("fakecopy{exit_code}"));
        std::fs::write(&path, format!("#!/bin/sh\nexit {exit_code}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_classification() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("DAM1.tif");
        std::fs::write(&src, b"0").unwrap();
        for (code, ok) in [(0, true), (1, true), (7, true), (8, false), (16, false)] {
            let bulk = BulkCopy::with_program(fake_program(temp.path(), code), BulkCopySettings::default());
            let result = bulk.run(&src, temp.path(), Mode::Copy).await;
            assert_eq!(result.is_ok(), ok, "exit code {code}");
            if let Err(e) = result {
                assert!(matches!(&*e, ErrorKind::BulkCopyFailed(Some(c)) if *c == code));
            }
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("DAM1.tif");
        std::fs::write(&src, b"0").unwrap();
        let bulk = BulkCopy::with_program(temp.path().join("no-such-program"), BulkCopySettings::default());
        let err = bulk.run(&src, temp.path(), Mode::Copy).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BulkCopyLaunch(_)));
    }
}

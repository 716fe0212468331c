//! On-disk artifact inspection.
//!
//! A packaged artifact is a directory whose entry point is a file of the
//! same name, e.g. `services/rankings-api/main`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ComputeError, ComputeResult};

/// What was found for one artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    pub artifact: PathBuf,
    pub entry_point: String,
    /// Size of the entry-point file in bytes.
    pub entry_size: u64,
    /// Total size of the regular files directly in the artifact directory.
    pub total_size: u64,
    pub file_count: usize,
    pub executable: bool,
}

/// Check that `dir` exists and contains the `entry_point` file.
///
/// `unit` only labels the error.
pub fn inspect_artifact(unit: &str, dir: &Path, entry_point: &str) -> ComputeResult<ArtifactReport> {
    if !dir.is_dir() {
        return Err(ComputeError::ArtifactNotFound {
            unit: unit.to_string(),
            artifact: dir.to_path_buf(),
        });
    }

    let entry = dir.join(entry_point);
    let entry_meta = match std::fs::metadata(&entry) {
        Ok(meta) if meta.is_file() => meta,
        _ => {
            return Err(ComputeError::EntryPointMissing {
                unit: unit.to_string(),
                artifact: dir.to_path_buf(),
                entry_point: entry_point.to_string(),
            })
        }
    };

    let mut total_size = 0;
    let mut file_count = 0;
    for dirent in std::fs::read_dir(dir)? {
        let meta = dirent?.metadata()?;
        if meta.is_file() {
            total_size += meta.len();
            file_count += 1;
        }
    }

    let report = ArtifactReport {
        artifact: dir.to_path_buf(),
        entry_point: entry_point.to_string(),
        entry_size: entry_meta.len(),
        total_size,
        file_count,
        executable: is_executable(&entry_meta),
    };
    tracing::debug!(
        unit,
        artifact = %dir.display(),
        entry_size = report.entry_size,
        executable = report.executable,
        "artifact inspected"
    );
    Ok(report)
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main"), b"\x7fELF....").unwrap();
        std::fs::write(dir.path().join("config.json"), b"{}").unwrap();

        let report = inspect_artifact("Rankings", dir.path(), "main").unwrap();
        assert_eq!(report.entry_point, "main");
        assert_eq!(report.entry_size, 8);
        assert_eq!(report.total_size, 10);
        assert_eq!(report.file_count, 2);
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect_artifact("Rankings", &dir.path().join("rankings-api"), "main").unwrap_err();
        assert!(matches!(err, ComputeError::ArtifactNotFound { .. }));
    }

    #[test]
    fn missing_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bootstrap"), b"x").unwrap();
        let err = inspect_artifact("Matchup", dir.path(), "main").unwrap_err();
        assert!(matches!(err, ComputeError::EntryPointMissing { unit, .. } if unit == "Matchup"));
    }

    #[test]
    fn entry_point_must_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("main")).unwrap();
        assert!(inspect_artifact("Matchup", dir.path(), "main").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn detects_executable_bit() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main");
        std::fs::write(&entry, b"bin").unwrap();
        std::fs::set_permissions(&entry, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(inspect_artifact("Rankings", dir.path(), "main").unwrap().executable);

        std::fs::set_permissions(&entry, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!inspect_artifact("Rankings", dir.path(), "main").unwrap().executable);
    }
}

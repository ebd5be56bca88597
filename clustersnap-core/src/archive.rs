//! Writing marshalled records to disk.

use crate::{
    Result,
    error::GatherError,
    runner::{ArchiveBundle, UnitFailure},
};
use std::path::{Component, Path};

/// Archive path of the failure list.
pub const FAILURES_ENTRY_PATH: &str = "clustersnap/failures.json";

/// Returns true when `path` is a non-empty relative path with no `..`.
pub fn is_safe_entry_path(path: &str) -> bool {
    let path = Path::new(path);
    path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Writes every entry of `bundle` below `dir`, creating directories as needed.
///
/// The failure list of the run is written to `clustersnap/failures.json`.
/// Returns the number of files written.
///
/// # Errors
/// Returns a configuration error for an entry path that would escape `dir`,
/// or an I/O error when a directory or file cannot be written.
pub async fn write_archive_dir(dir: &Path, bundle: &ArchiveBundle) -> Result<usize> {
    for entry in &bundle.entries {
        if !is_safe_entry_path(&entry.path) {
            return Err(GatherError::configuration(format!(
                "Refusing to write archive entry outside the output directory: {}",
                entry.path
            )));
        }
    }

    for entry in &bundle.entries {
        write_file(&dir.join(&entry.path), &entry.bytes).await?;
    }

    let failures = failures_json(&bundle.failures)?;
    write_file(&dir.join(FAILURES_ENTRY_PATH), &failures).await?;

    let written = bundle.entries.len().saturating_add(1);

    tracing::info!("Wrote {} archive files to {}", written, dir.display());
    Ok(written)
}

fn failures_json(failures: &[UnitFailure]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(failures)
        .map_err(|e| GatherError::serialization_failed("failure list", e))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GatherError::Io {
                context: format!("Failed to create directory {}", parent.display()),
                source: e,
            })?;
    }

    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| GatherError::Io {
            context: format!("Failed to write to {}", path.display()),
            source: e,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::ArchiveEntry;
    use tempfile::TempDir;

    fn entry(path: &str, body: &str) -> ArchiveEntry {
        ArchiveEntry {
            path: path.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_safe_entry_paths() {
        assert!(is_safe_entry_path("config/authentication.json"));
        assert!(is_safe_entry_path("machinesets/openshift-machine-api/worker.json"));
        assert!(!is_safe_entry_path("/etc/passwd"));
        assert!(!is_safe_entry_path("config/../../escape.json"));
        assert!(!is_safe_entry_path(""));
    }

    #[tokio::test]
    async fn test_write_archive_dir_creates_nested_files() {
        let dir = TempDir::new().unwrap();
        let bundle = ArchiveBundle {
            entries: vec![
                entry("config/authentication.json", "{}"),
                entry("config/crd/volumesnapshots.snapshot.storage.k8s.io.json", "{\"a\":1}"),
            ],
            failures: vec![UnitFailure {
                gatherer: "clusterconfig/proxy".to_string(),
                error_message: "Operation cancelled".to_string(),
            }],
        };

        let written = write_archive_dir(dir.path(), &bundle).await.unwrap();
        assert_eq!(written, 3);

        let crd = std::fs::read_to_string(
            dir.path()
                .join("config/crd/volumesnapshots.snapshot.storage.k8s.io.json"),
        )
        .unwrap();
        assert_eq!(crd, "{\"a\":1}");

        let failures: Vec<UnitFailure> =
            serde_json::from_slice(&std::fs::read(dir.path().join(FAILURES_ENTRY_PATH)).unwrap())
                .unwrap();
        assert_eq!(failures, bundle.failures);
    }

    #[tokio::test]
    async fn test_write_archive_dir_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let bundle = ArchiveBundle {
            entries: vec![entry("ok.json", "{}"), entry("../escape.json", "{}")],
            failures: Vec::new(),
        };

        let err = write_archive_dir(dir.path(), &bundle).await.unwrap_err();
        assert!(matches!(err, GatherError::Configuration { .. }));
        assert!(!dir.path().join("ok.json").exists());
    }
}

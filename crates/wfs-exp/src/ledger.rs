use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use wfs_core::{ErrorInfo, RunId, WfsError};

/// Append-only list of the run ids of one experiment, kept as a JSON array.
///
/// Every append rewrites the whole file through a temporary file and an
/// atomic rename, so a crash leaves either the old or the new list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLedger {
    path: PathBuf,
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    /// Zero-based position of the new id.
    pub position: usize,
    /// Where an unreadable previous ledger was moved before starting afresh.
    pub quarantined: Option<PathBuf>,
}

impl RunLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids in append order. A missing file is an empty ledger.
    pub fn read_all(&self) -> Result<Vec<RunId>, WfsError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents =
            fs::read_to_string(&self.path).map_err(|err| WfsError::io("ledger-read", &self.path, err))?;
        serde_json::from_str(&contents).map_err(|err| {
            WfsError::CorruptLedger(
                ErrorInfo::new("ledger-parse", err.to_string())
                    .with_context("path", self.path.display().to_string())
                    .with_hint("the file is moved aside on the next append"),
            )
        })
    }

    /// Persists `id` after the existing ids.
    ///
    /// A corrupt ledger is moved to `<name>.corrupt[.N]` and a fresh list is
    /// started; the receipt reports where it went.
    pub fn append(&self, id: &RunId) -> Result<AppendReceipt, WfsError> {
        let (mut ids, quarantined) = match self.read_all() {
            Ok(ids) => (ids, None),
            Err(WfsError::CorruptLedger(info)) => {
                let moved = self.quarantine()?;
                warn!(path = %self.path.display(), moved = %moved.display(), error = %info, "starting a fresh ledger");
                (Vec::new(), Some(moved))
            }
            Err(other) => return Err(other),
        };
        ids.push(id.clone());
        self.write(&ids)?;
        debug!(path = %self.path.display(), run_id = %id, count = ids.len(), "ledger appended");
        Ok(AppendReceipt {
            position: ids.len() - 1,
            quarantined,
        })
    }

    fn write(&self, ids: &[RunId]) -> Result<(), WfsError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|err| WfsError::io("ledger-mkdir", &parent, err))?;
        let bytes = to_tab_indented_json(ids)?;
        let mut tmp =
            NamedTempFile::new_in(&parent).map_err(|err| WfsError::io("ledger-tmp", &parent, err))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| WfsError::io("ledger-write", tmp.path(), err))?;
        tmp.persist(&self.path)
            .map_err(|err| WfsError::io("ledger-persist", &self.path, err.error))?;
        Ok(())
    }

    fn quarantine(&self) -> Result<PathBuf, WfsError> {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "run_ids.json".to_string());
        let mut target = self.path.with_file_name(format!("{name}.corrupt"));
        let mut suffix = 1;
        while target.exists() {
            target = self.path.with_file_name(format!("{name}.corrupt.{suffix}"));
            suffix += 1;
        }
        fs::rename(&self.path, &target).map_err(|err| WfsError::io("ledger-quarantine", &self.path, err))?;
        Ok(target)
    }
}

fn to_tab_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, WfsError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| WfsError::Serde(ErrorInfo::new("ledger-encode", err.to_string())))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_tab_indented_array() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RunLedger::open(dir.path().join("run_ids.json"));
        ledger.append(&RunId::Numeric(11)).unwrap();
        ledger.append(&RunId::Numeric(12)).unwrap();
        let text = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(text, "[\n\t11,\n\t12\n]");
    }
}

// Mon Oct 19 2026 - Alex

use crate::binary::BinaryIdentity;
use crate::error::{AuditError, Result};
use crate::structure::snapshot::{Snapshot, EXTRACTOR_VERSION, SNAPSHOT_FORMAT_VERSION};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Directory of persisted snapshots, one JSON file per binary identity and
/// extractor version.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &BinaryIdentity) -> PathBuf {
        self.dir
            .join(format!("{}-v{}.json", identity.key(), EXTRACTOR_VERSION))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        let identity = snapshot
            .meta()
            .identity
            .as_ref()
            .ok_or_else(|| AuditError::Snapshot("snapshot has no binary identity".to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(identity);
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(snapshot.to_json()?.as_bytes())?;
        writer.flush()?;

        log::info!("saved snapshot of {} types to {}", snapshot.len(), path.display());
        Ok(path)
    }

    /// Snapshot previously saved for `identity`, if any.
    pub fn load(&self, identity: &BinaryIdentity) -> Result<Option<Snapshot>> {
        let path = self.path_for(identity);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_file(&path).map(Some)
    }

    pub fn load_file(path: &Path) -> Result<Snapshot> {
        let text = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        let meta = snapshot.meta();
        if meta.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(AuditError::Snapshot(format!(
                "{} has format version {}, expected {}",
                path.display(),
                meta.format_version,
                SNAPSHOT_FORMAT_VERSION
            )));
        }
        Ok(snapshot)
    }
}

// Mon Oct 19 2026 - Alex

use crate::analysis::{BudgetOutcome, PaddingAnalyzer, TypeReport};
use crate::binary::{BinaryIdentity, BinaryImage, DebugSections};
use crate::builder::{BuildOutput, LayoutBuilder};
use crate::config::AuditConfig;
use crate::diff::{DiffResult, SnapshotDiffer};
use crate::error::{AuditError, Result};
use crate::extract::DwarfExtractor;
use crate::structure::{Snapshot, SnapshotMeta, SnapshotStore};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::Path;

/// Load, extract and build, on a thread pool sized from the config.
pub struct AuditPipeline {
    config: AuditConfig,
    pool: ThreadPool,
}

impl AuditPipeline {
    pub fn new(config: AuditConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.max_threads)
            .thread_name(|i| format!("layout-worker-{}", i))
            .build()
            .map_err(|e| AuditError::Config(format!("thread pool: {}", e)))?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn snapshot_from_path<P: AsRef<Path>>(&self, path: P) -> Result<BuildOutput> {
        let image = BinaryImage::open(path)?;
        self.snapshot_from_image(&image)
    }

    pub fn snapshot_from_bytes(&self, bytes: Vec<u8>) -> Result<BuildOutput> {
        let image = BinaryImage::from_bytes(bytes);
        self.snapshot_from_image(&image)
    }

    pub fn snapshot_from_image(&self, image: &BinaryImage) -> Result<BuildOutput> {
        let sections = image.debug_sections()?;
        self.snapshot_from_sections(&sections, Some(image.identity()))
    }

    pub fn snapshot_from_sections(
        &self,
        sections: &DebugSections<'_>,
        identity: Option<BinaryIdentity>,
    ) -> Result<BuildOutput> {
        let extractor = DwarfExtractor::new(sections)?;
        let units = self.pool.install(|| extractor.extract_all())?;

        let mut builder = LayoutBuilder::new(extractor.endian(), extractor.address_size());
        for unit in units {
            builder.ingest(unit);
        }
        let mut meta = SnapshotMeta::new(extractor.address_size());
        if let Some(identity) = identity {
            meta = meta.with_identity(identity);
        }
        builder.finish(meta)
    }

    /// Reuse a stored snapshot for this binary when the config names a snapshot
    /// directory, extracting and storing one otherwise.
    pub fn cached_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<BuildOutput> {
        let Some(dir) = &self.config.snapshot_dir else {
            return self.snapshot_from_path(path);
        };
        let store = SnapshotStore::new(dir);
        let image = BinaryImage::open(path)?;

        if let Some(snapshot) = store.load(&image.identity())? {
            log::info!("reusing stored snapshot for {}", image.identity());
            return Ok(BuildOutput {
                snapshot,
                diagnostics: Vec::new(),
            });
        }

        let output = self.snapshot_from_image(&image)?;
        store.save(&output.snapshot)?;
        Ok(output)
    }

    pub fn analyze(&self, snapshot: &Snapshot) -> Result<Vec<TypeReport>> {
        let analyzer = PaddingAnalyzer::new(&self.config)?;
        Ok(self.pool.install(|| analyzer.analyze_snapshot(snapshot)))
    }

    /// Analyze the snapshot and hold every report to the configured budgets.
    pub fn check(&self, snapshot: &Snapshot) -> Result<BudgetOutcome> {
        let budgets = self.config.budget_set()?;
        let reports = self.analyze(snapshot)?;
        Ok(budgets.check(&reports))
    }

    pub fn diff(&self, before: &Snapshot, after: &Snapshot) -> DiffResult {
        self.pool.install(|| SnapshotDiffer::new().diff(before, after))
    }
}

// Mon Oct 19 2026 - Alex

//! Recovers the memory layout of every named aggregate from DWARF debug
//! information, reports padding and cache behaviour, and diffs layouts across
//! builds.

pub mod analysis;
pub mod binary;
pub mod builder;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod extract;
pub mod structure;
pub mod testing;
pub mod ui;

pub use analysis::{BudgetOutcome, PaddingAnalyzer, TypeBudget, TypeReport};
pub use binary::{BinaryIdentity, BinaryImage, DebugSections};
pub use builder::{BuildOutput, LayoutBuilder};
pub use config::AuditConfig;
pub use diff::{DiffResult, SnapshotDiffer};
pub use engine::AuditPipeline;
pub use error::{AuditError, Diagnostic, Result, Stage};
pub use extract::DwarfExtractor;
pub use structure::{Snapshot, SnapshotStore, TypeLayout};

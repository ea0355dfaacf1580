// Mon Oct 19 2026 - Alex

pub mod analyzer;
pub mod changes;
pub mod ordering;
pub mod report;

pub use analyzer::SnapshotDiffer;
pub use changes::{ChangeSeverity, MemberChange};
pub use report::{DiffResult, TypeDiff};

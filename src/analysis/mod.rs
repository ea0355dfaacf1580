// Mon Oct 19 2026 - Alex

pub mod budget;
pub mod cache;
pub mod false_sharing;
pub mod padding;
pub mod reorder;

pub use budget::{BudgetOutcome, BudgetSet, BudgetViolation, TypeBudget, ViolationKind};
pub use cache::{straddles_lines, CacheFit, HotPathMatcher};
pub use false_sharing::{analyze_false_sharing, FalseSharingKind, FalseSharingWarning};
pub use padding::{attributed_padding, PaddingAnalyzer, TypeReport};
pub use reorder::{reorder_candidate, ReorderCandidate};

// Mon Oct 19 2026 - Alex

use crate::diff::changes::{ChangeSeverity, MemberChange};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Changes to one type present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDiff {
    pub name: String,
    pub old_size: u64,
    pub new_size: u64,
    pub old_align: u64,
    pub new_align: u64,
    pub changes: Vec<MemberChange>,
}

impl TypeDiff {
    pub fn size_delta(&self) -> i64 {
        self.new_size as i64 - self.old_size as i64
    }

    pub fn has_breaking_changes(&self) -> bool {
        self.changes.iter().any(|c| c.is_breaking())
    }

    pub fn severity(&self) -> Option<ChangeSeverity> {
        self.changes.iter().map(|c| c.severity()).max()
    }

    pub fn changes_of(&self, severity: ChangeSeverity) -> impl Iterator<Item = &MemberChange> {
        self.changes.iter().filter(move |c| c.severity() == severity)
    }
}

impl fmt::Display for TypeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.old_size != self.new_size {
            write!(f, " (size {} -> {}, {:+})", self.old_size, self.new_size, self.size_delta())?;
        }
        writeln!(f)?;
        for change in &self.changes {
            writeln!(f, "  [{}] {}", change.severity(), change)?;
        }
        Ok(())
    }
}

/// Outcome of comparing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeMap<String, TypeDiff>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Removed types and breaking member changes both count.
    pub fn has_breaking_changes(&self) -> bool {
        !self.removed.is_empty() || self.changed.values().any(|d| d.has_breaking_changes())
    }

    pub fn change_count(&self) -> usize {
        self.changed.values().map(|d| d.changes.len()).sum()
    }

    /// Type name to its member changes.
    pub fn changes_by_type(&self) -> BTreeMap<&str, &[MemberChange]> {
        self.changed
            .iter()
            .map(|(name, diff)| (name.as_str(), diff.changes.as_slice()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Diff: {} added, {} removed, {} changed ({} member changes)",
            self.added.len(),
            self.removed.len(),
            self.changed.len(),
            self.change_count()
        )?;
        for name in &self.added {
            writeln!(f, "+ {}", name)?;
        }
        for name in &self.removed {
            writeln!(f, "- {}", name)?;
        }
        for diff in self.changed.values() {
            write!(f, "~ {}", diff)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaking_classification() {
        let mut result = DiffResult::default();
        assert!(result.is_empty());
        assert!(!result.has_breaking_changes());

        result.changed.insert(
            "Config".to_string(),
            TypeDiff {
                name: "Config".to_string(),
                old_size: 12,
                new_size: 16,
                old_align: 4,
                new_align: 4,
                changes: vec![MemberChange::MemberAdded {
                    member: "d".to_string(),
                    offset: 12,
                    size: 4,
                }],
            },
        );
        assert!(!result.has_breaking_changes());
        assert_eq!(result.changed["Config"].size_delta(), 4);
        assert_eq!(result.changed["Config"].severity(), Some(ChangeSeverity::Minor));

        result.removed.insert("Inner".to_string());
        assert!(result.has_breaking_changes());
        assert!(result.to_string().contains("- Inner"));
    }
}

// Mon Oct 19 2026 - Alex

use crate::binary::BinaryIdentity;
use crate::structure::TypeLayout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;
pub const EXTRACTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub format_version: u32,
    pub extractor_version: String,
    pub address_size: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identity: Option<BinaryIdentity>,
}

impl SnapshotMeta {
    pub fn new(address_size: u8) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            extractor_version: EXTRACTOR_VERSION.to_string(),
            address_size,
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: BinaryIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// Every aggregate of one binary, keyed by qualified name.
///
/// There are no mutating methods; wrap it in an `Arc` to share it between
/// concurrent analyzer and differ runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    meta: SnapshotMeta,
    types: BTreeMap<String, TypeLayout>,
}

impl Snapshot {
    pub fn from_layouts<I>(meta: SnapshotMeta, layouts: I) -> Self
    where
        I: IntoIterator<Item = TypeLayout>,
    {
        let types = layouts.into_iter().map(|l| (l.name.clone(), l)).collect();
        Self { meta, types }
    }

    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    pub fn get(&self, name: &str) -> Option<&TypeLayout> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Layouts in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeLayout> {
        self.types.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Deterministic serialized form; identical snapshots give identical bytes.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Member, TypeKind};

    #[test]
    fn test_layouts_keyed_and_sorted_by_name() {
        let snapshot = Snapshot::from_layouts(
            SnapshotMeta::new(8),
            vec![
                TypeLayout::new("Outer", TypeKind::Struct, 16, 4, vec![]),
                TypeLayout::new("Inner", TypeKind::Struct, 8, 4, vec![Member::primitive("x", "int", 0, 4)]),
            ],
        );
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["Inner", "Outer"]);
        assert!(snapshot.contains("Inner"));
        assert_eq!(snapshot.get("Inner").map(|l| l.size), Some(8));
    }

    #[test]
    fn test_json_round_trip_is_stable() {
        let snapshot = Snapshot::from_layouts(
            SnapshotMeta::new(8),
            vec![TypeLayout::new("NoPadding", TypeKind::Struct, 12, 4, vec![
                Member::primitive("a", "int", 0, 4),
                Member::primitive("b", "int", 4, 4),
                Member::primitive("c", "int", 8, 4),
            ])],
        );
        let first = snapshot.to_json().unwrap();
        let reloaded: Snapshot = serde_json::from_str(&first).unwrap();
        assert_eq!(reloaded, snapshot);
        assert_eq!(reloaded.to_json().unwrap(), first);
    }
}

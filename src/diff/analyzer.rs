// Mon Oct 19 2026 - Alex

use crate::diff::changes::MemberChange;
use crate::diff::ordering::moved_positions;
use crate::diff::report::{DiffResult, TypeDiff};
use crate::structure::{Member, Snapshot, TypeLayout};
use indexmap::IndexMap;
use rayon::prelude::*;

/// Compares two snapshots type by type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotDiffer;

impl SnapshotDiffer {
    pub fn new() -> Self {
        Self
    }

    pub fn diff(&self, before: &Snapshot, after: &Snapshot) -> DiffResult {
        let mut result = DiffResult::default();

        // Types on one side only
        result.removed = before
            .names()
            .filter(|name| !after.contains(name))
            .map(str::to_string)
            .collect();
        result.added = after
            .names()
            .filter(|name| !before.contains(name))
            .map(str::to_string)
            .collect();

        let common: Vec<(&TypeLayout, &TypeLayout)> = before
            .iter()
            .filter_map(|old| after.get(&old.name).map(|new| (old, new)))
            .collect();
        result.changed = common
            .par_iter()
            .filter_map(|(old, new)| self.diff_types(old, new))
            .map(|diff| (diff.name.clone(), diff))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        log::info!(
            "diff: {} added, {} removed, {} changed",
            result.added.len(),
            result.removed.len(),
            result.changed.len()
        );
        result
    }

    /// Member-level comparison of two versions of one type; `None` when identical.
    pub fn diff_types(&self, before: &TypeLayout, after: &TypeLayout) -> Option<TypeDiff> {
        let old_members = keyed(before);
        let new_members = keyed(after);
        let mut changes = Vec::new();

        for (key, (_, old)) in &old_members {
            match new_members.get(key) {
                None => changes.push(MemberChange::MemberRemoved {
                    member: key.clone(),
                    offset: old.offset,
                    size: old.size,
                }),
                Some((_, new)) => changes.extend(compare_member(key, old, new)),
            }
        }

        for (key, (_, new)) in &new_members {
            if !old_members.contains_key(key) {
                changes.push(MemberChange::MemberAdded {
                    member: key.clone(),
                    offset: new.offset,
                    size: new.size,
                });
            }
        }

        let member_changed = !changes.is_empty();
        changes.extend(reordered(&old_members, &new_members, &changes));

        if !member_changed && (before.size != after.size || before.align != after.align) {
            changes.push(MemberChange::OpaqueLayoutChanged {
                old_size: before.size,
                new_size: after.size,
                old_align: before.align,
                new_align: after.align,
            });
        }

        if changes.is_empty() {
            return None;
        }
        Some(TypeDiff {
            name: after.name.clone(),
            old_size: before.size,
            new_size: after.size,
            old_align: before.align,
            new_align: after.align,
            changes,
        })
    }
}

/// Members by key with their position. A key seen again gets an occurrence
/// suffix (`name#1`) so no member drops out of the comparison.
fn keyed(layout: &TypeLayout) -> IndexMap<String, (usize, &Member)> {
    let mut members = IndexMap::with_capacity(layout.members.len());
    for (position, member) in layout.members.iter().enumerate() {
        let base = member.key();
        let mut key = base.clone();
        let mut occurrence = 0usize;
        while members.contains_key(&key) {
            occurrence += 1;
            key = format!("{}#{}", base, occurrence);
        }
        members.insert(key, (position, member));
    }
    members
}

/// At most one change per member pair, most significant first.
fn compare_member(key: &str, old: &Member, new: &Member) -> Option<MemberChange> {
    if old.offset != new.offset {
        return Some(MemberChange::OffsetChanged {
            member: key.to_string(),
            old_offset: old.offset,
            new_offset: new.offset,
        });
    }
    if old.size != new.size || old.bit_width != new.bit_width {
        return Some(MemberChange::SizeChanged {
            member: key.to_string(),
            old_size: old.size,
            new_size: new.size,
            old_bit_width: old.bit_width,
            new_bit_width: new.bit_width,
        });
    }
    if old.bit_offset != new.bit_offset {
        return Some(MemberChange::BitfieldChanged {
            member: key.to_string(),
            old_bit_offset: old.bit_offset,
            new_bit_offset: new.bit_offset,
        });
    }
    if old.type_name != new.type_name {
        return Some(MemberChange::TypeChanged {
            member: key.to_string(),
            old_type: old.type_name.clone(),
            new_type: new.type_name.clone(),
        });
    }
    None
}

/// Unchanged members whose relative order differs between the two versions.
fn reordered(
    old_members: &IndexMap<String, (usize, &Member)>,
    new_members: &IndexMap<String, (usize, &Member)>,
    changes: &[MemberChange],
) -> Vec<MemberChange> {
    let untouched = |key: &String| changes.iter().all(|c| c.member() != Some(key.as_str()));
    let old_order: Vec<&String> = old_members
        .keys()
        .filter(|k| new_members.contains_key(*k) && untouched(*k))
        .collect();
    let new_order: Vec<&String> = new_members
        .keys()
        .filter(|k| old_members.contains_key(*k) && untouched(*k))
        .collect();

    moved_positions(&old_order, &new_order)
        .into_iter()
        .filter_map(|i| {
            let key = old_order[i];
            let (old_index, _) = old_members.get(key)?;
            let (new_index, _) = new_members.get(key)?;
            Some(MemberChange::Reordered {
                member: key.clone(),
                old_index: *old_index,
                new_index: *new_index,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{SnapshotMeta, TypeKind};

    fn ints(name: &str, count: u64) -> TypeLayout {
        let members = ["a", "b", "c", "d", "e"]
            .iter()
            .take(count as usize)
            .enumerate()
            .map(|(i, n)| Member::primitive(n, "int", i as u64 * 4, 4))
            .collect();
        TypeLayout::new(name, TypeKind::Struct, count * 4, 4, members)
    }

    fn snapshot(layouts: Vec<TypeLayout>) -> Snapshot {
        Snapshot::from_layouts(SnapshotMeta::new(8), layouts)
    }

    #[test]
    fn test_identical_snapshots() {
        let s = snapshot(vec![ints("NoPadding", 3), ints("Other", 2)]);
        assert!(SnapshotDiffer::new().diff(&s, &s).is_empty());
    }

    #[test]
    fn test_member_appended() {
        let diff = SnapshotDiffer::new()
            .diff_types(&ints("NoPadding", 3), &ints("NoPadding", 4))
            .unwrap();
        assert_eq!(
            diff.changes,
            vec![MemberChange::MemberAdded {
                member: "d".to_string(),
                offset: 12,
                size: 4
            }]
        );
        assert_eq!((diff.old_size, diff.new_size), (12, 16));
        assert!(!diff.has_breaking_changes());
    }

    #[test]
    fn test_types_added_and_removed() {
        let before = snapshot(vec![ints("Inner", 1), ints("Outer", 2), ints("Kept", 1)]);
        let after = snapshot(vec![ints("Kept", 1), ints("Fresh", 1)]);
        let result = SnapshotDiffer::new().diff(&before, &after);
        assert_eq!(result.removed.iter().map(String::as_str).collect::<Vec<_>>(), vec!["Inner", "Outer"]);
        assert_eq!(result.added.iter().map(String::as_str).collect::<Vec<_>>(), vec!["Fresh"]);
        assert!(result.changed.is_empty());
        assert!(result.has_breaking_changes());
    }

    #[test]
    fn test_offset_beats_size() {
        let before = TypeLayout::new(
            "T",
            TypeKind::Struct,
            8,
            4,
            vec![Member::primitive("a", "int", 0, 4), Member::primitive("b", "int", 4, 4)],
        );
        let after = TypeLayout::new(
            "T",
            TypeKind::Struct,
            16,
            8,
            vec![Member::primitive("a", "long", 0, 8), Member::primitive("b", "long", 8, 8)],
        );
        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert!(matches!(diff.changes[0], MemberChange::SizeChanged { old_size: 4, new_size: 8, .. }));
        assert!(matches!(diff.changes[1], MemberChange::OffsetChanged { old_offset: 4, new_offset: 8, .. }));
        assert_eq!(diff.changes.len(), 2);
    }

    #[test]
    fn test_bitfield_changes() {
        let before = TypeLayout::new(
            "Flags",
            TypeKind::Struct,
            4,
            4,
            vec![
                Member::primitive("lo", "unsigned", 0, 4).with_bits(0, 3),
                Member::primitive("hi", "unsigned", 0, 4).with_bits(3, 5),
            ],
        );
        let mut after = before.clone();
        after.members[0].bit_width = Some(4);
        after.members[1].bit_offset = Some(4);

        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert!(matches!(&diff.changes[0], MemberChange::SizeChanged { new_bit_width: Some(4), .. }));
        assert!(matches!(&diff.changes[1], MemberChange::BitfieldChanged { new_bit_offset: Some(4), .. }));
    }

    #[test]
    fn test_union_reorder_is_informational() {
        let before = TypeLayout::new(
            "U",
            TypeKind::Union,
            4,
            4,
            vec![Member::primitive("i", "int", 0, 4), Member::primitive("f", "float", 0, 4)],
        );
        let after = TypeLayout::new(
            "U",
            TypeKind::Union,
            4,
            4,
            vec![Member::primitive("f", "float", 0, 4), Member::primitive("i", "int", 0, 4)],
        );
        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert!(matches!(diff.changes[0], MemberChange::Reordered { .. }));
        assert!(!diff.has_breaking_changes());
    }

    #[test]
    fn test_opaque_layout_change() {
        let before = ints("Aligned", 2);
        let after = TypeLayout::new("Aligned", TypeKind::Struct, 16, 16, before.members.clone());
        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert_eq!(
            diff.changes,
            vec![MemberChange::OpaqueLayoutChanged {
                old_size: 8,
                new_size: 16,
                old_align: 4,
                new_align: 16
            }]
        );
    }

    #[test]
    fn test_retyped_member() {
        let before = ints("Value", 2);
        let mut after = before.clone();
        after.members[1] = Member::primitive("b", "float", 4, 4);

        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert_eq!(
            diff.changes,
            vec![MemberChange::TypeChanged {
                member: "b".to_string(),
                old_type: "int".to_string(),
                new_type: "float".to_string(),
            }]
        );
        assert!(!diff.has_breaking_changes());

        after.members[1] = Member::primitive("b", "double", 8, 8);
        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert!(matches!(diff.changes[0], MemberChange::OffsetChanged { .. }));
    }

    #[test]
    fn test_repeated_keys_are_all_compared() {
        let before = TypeLayout::new(
            "D",
            TypeKind::Struct,
            8,
            4,
            vec![Member::primitive("id", "int", 0, 4), Member::primitive("id", "int", 4, 4)],
        );
        let mut after = before.clone();
        after.size = 12;
        after.members[1].offset = 8;

        let diff = SnapshotDiffer::new().diff_types(&before, &after).unwrap();
        assert_eq!(
            diff.changes,
            vec![MemberChange::OffsetChanged {
                member: "id#1".to_string(),
                old_offset: 4,
                new_offset: 8,
            }]
        );
    }
}

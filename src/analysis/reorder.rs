// Mon Oct 19 2026 - Alex

use crate::structure::alignment::align_up;
use crate::structure::{Member, TypeKind, TypeLayout};
use serde::{Deserialize, Serialize};

/// Member order with less padding, or the original order when none is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderCandidate {
    pub members: Vec<Member>,
    pub candidate_size: u64,
    pub candidate_padding: u64,
    pub savings_bytes: u64,
}

impl ReorderCandidate {
    pub fn improves(&self) -> bool {
        self.savings_bytes > 0
    }
}

/// Members that must stay together: a single member, or every bitfield sharing
/// one storage unit.
struct Placement<'a> {
    members: Vec<&'a Member>,
    base: u64,
    size: u64,
    align: u64,
    pinned_last: bool,
}

fn placements(layout: &TypeLayout) -> Vec<Placement<'_>> {
    let mut out: Vec<Placement<'_>> = Vec::new();
    for member in &layout.members {
        if let Some(last) = out.last_mut() {
            let shares_unit = member.is_bitfield()
                && last.members.iter().all(|m| m.is_bitfield())
                && last.base == member.offset;
            if shares_unit {
                last.size = last.size.max(member.size);
                last.align = last.align.max(member.align);
                last.members.push(member);
                continue;
            }
        }
        out.push(Placement {
            members: vec![member],
            base: member.offset,
            size: member.size,
            align: member.align,
            pinned_last: member.is_flexible_array(),
        });
    }
    out
}

/// Greedy largest-alignment-first ordering of a struct's members.
///
/// Placements are sorted descending by `(align, size)`, ties keeping declaration
/// order, then packed at their natural alignment. Returns `None` for unions,
/// enums, packed types and types with unresolved members.
pub fn reorder_candidate(layout: &TypeLayout) -> Option<ReorderCandidate> {
    if !matches!(layout.kind, TypeKind::Struct | TypeKind::Class) {
        return None;
    }
    if layout.is_packed || layout.has_unresolved() || layout.members.is_empty() {
        return None;
    }

    let mut units = placements(layout);
    units.sort_by(|a, b| {
        a.pinned_last
            .cmp(&b.pinned_last)
            .then_with(|| (b.align, b.size).cmp(&(a.align, a.size)))
    });

    let mut members = Vec::with_capacity(layout.members.len());
    let mut cursor = 0u64;
    for unit in &units {
        let start = align_up(cursor, unit.align);
        for member in &unit.members {
            let mut moved = (*member).clone();
            moved.offset = start.saturating_add(member.offset - unit.base);
            members.push(moved);
        }
        cursor = start.saturating_add(unit.size);
    }

    let mut candidate_size = align_up(cursor, layout.align);
    if candidate_size == 0 && layout.size > 0 {
        candidate_size = layout.align;
    }
    let candidate = TypeLayout::new(&layout.name, layout.kind, candidate_size, layout.align, members);
    let original_padding = layout.padding_bytes();

    if candidate.padding_bytes() < original_padding && candidate_size <= layout.size {
        Some(ReorderCandidate {
            savings_bytes: layout.size - candidate_size,
            candidate_padding: candidate.padding_bytes(),
            candidate_size,
            members: candidate.members,
        })
    } else {
        Some(ReorderCandidate {
            members: layout.members.clone(),
            candidate_size: layout.size,
            candidate_padding: original_padding,
            savings_bytes: 0,
        })
    }
}

// Mon Oct 19 2026 - Alex

use crate::structure::{Member, TypeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    Internal,
    Tail,
}

/// A run of bytes inside a type that no member's bits touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingGap {
    pub offset: u64,
    pub size: u64,
    pub kind: GapKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_member: Option<String>,
}

/// Merged byte ranges covered by resolved members, in ascending order.
///
/// Overlapping spans (union members, bitfields sharing a storage unit) merge, so
/// nothing is counted twice. Each range remembers the member that ends it.
pub fn covered_ranges(members: &[Member], type_size: u64) -> Vec<(u64, u64, String)> {
    let mut spans: Vec<(u64, u64, &Member)> = members
        .iter()
        .filter(|m| !m.is_unresolved())
        .map(|m| {
            let (start, end) = m.byte_span();
            (start.min(type_size), end.min(type_size), m)
        })
        .filter(|(start, end, _)| end > start)
        .collect();
    spans.sort_by_key(|(start, end, _)| (*start, *end));

    let mut merged: Vec<(u64, u64, String)> = Vec::new();
    for (start, end, member) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => {
                if end >= last.1 {
                    last.1 = end;
                    last.2 = member.key();
                }
            }
            _ => merged.push((start, end, member.key())),
        }
    }
    merged
}

/// Internal and tail gaps of a laid-out type.
///
/// Enums are scalar storage and never have gaps.
pub fn compute_gaps(kind: TypeKind, size: u64, members: &[Member]) -> Vec<PaddingGap> {
    if kind == TypeKind::Enum {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    let mut cursor = 0u64;
    let mut last_member: Option<String> = None;

    for (start, end, member) in covered_ranges(members, size) {
        if start > cursor {
            gaps.push(PaddingGap {
                offset: cursor,
                size: start - cursor,
                kind: GapKind::Internal,
                after_member: last_member.clone(),
            });
        }
        cursor = end;
        last_member = Some(member);
    }

    if cursor < size {
        gaps.push(PaddingGap {
            offset: cursor,
            size: size - cursor,
            kind: GapKind::Tail,
            after_member: last_member,
        });
    }

    gaps
}

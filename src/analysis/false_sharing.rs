// Mon Oct 19 2026 - Alex

use crate::structure::{Member, TypeLayout};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalseSharingKind {
    /// Two atomics live on the same cache line.
    SharedLine,
    /// One atomic crosses a line boundary.
    SpansLines,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalseSharingWarning {
    pub type_name: String,
    pub kind: FalseSharingKind,
    pub member_a: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_b: Option<String>,
    pub cache_line: u64,
}

impl fmt::Display for FalseSharingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.member_b) {
            (FalseSharingKind::SharedLine, Some(other)) => write!(
                f,
                "{}: atomics {} and {} share cache line {}",
                self.type_name, self.member_a, other, self.cache_line
            ),
            _ => write!(
                f,
                "{}: atomic {} crosses into cache line {}",
                self.type_name, self.member_a, self.cache_line
            ),
        }
    }
}

/// Lines `[first, last]` a member's bytes touch, or `None` if it has no bytes.
fn lines_of(member: &Member, line_size: u64) -> Option<(u64, u64)> {
    let (start, end) = member.byte_span();
    if end <= start {
        return None;
    }
    Some((start / line_size, (end - 1) / line_size))
}

/// Atomic members that contend for the same cache line, relative to a
/// line-aligned instance.
pub fn analyze_false_sharing(layout: &TypeLayout, line_size: u64) -> Vec<FalseSharingWarning> {
    let line_size = line_size.max(1);
    let atomics: Vec<(&Member, (u64, u64))> = layout
        .members
        .iter()
        .filter(|m| m.is_atomic)
        .filter_map(|m| lines_of(m, line_size).map(|lines| (m, lines)))
        .collect();

    let mut warnings = Vec::new();
    for (member, (first, last)) in &atomics {
        if first != last {
            warnings.push(FalseSharingWarning {
                type_name: layout.name.clone(),
                kind: FalseSharingKind::SpansLines,
                member_a: member.key(),
                member_b: None,
                cache_line: *last,
            });
        }
    }

    for (i, (a, (a_first, a_last))) in atomics.iter().enumerate() {
        for (b, (b_first, b_last)) in &atomics[i + 1..] {
            let shared = (*a_first).max(*b_first);
            if shared <= (*a_last).min(*b_last) {
                warnings.push(FalseSharingWarning {
                    type_name: layout.name.clone(),
                    kind: FalseSharingKind::SharedLine,
                    member_a: a.key(),
                    member_b: Some(b.key()),
                    cache_line: shared,
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::TypeKind;

    fn counter(name: &str, offset: u64) -> Member {
        Member::primitive(name, "long", offset, 8).with_atomic(true)
    }

    #[test]
    fn test_shared_line() {
        let layout = TypeLayout::new(
            "Counters",
            TypeKind::Struct,
            16,
            8,
            vec![counter("reads", 0), counter("writes", 8)],
        );
        let warnings = analyze_false_sharing(&layout, 64);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, FalseSharingKind::SharedLine);
        assert_eq!(warnings[0].member_b.as_deref(), Some("writes"));
        assert_eq!(warnings[0].cache_line, 0);
    }

    #[test]
    fn test_separate_lines_are_clean() {
        let layout = TypeLayout::new(
            "Padded",
            TypeKind::Struct,
            128,
            64,
            vec![counter("reads", 0), counter("writes", 64)],
        );
        assert!(analyze_false_sharing(&layout, 64).is_empty());
    }

    #[test]
    fn test_spanning_atomic() {
        let layout = TypeLayout::new(
            "Odd",
            TypeKind::Struct,
            72,
            1,
            vec![Member::primitive("pad", "char", 0, 60), counter("tick", 60)],
        )
        .with_packed(true);
        let warnings = analyze_false_sharing(&layout, 64);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, FalseSharingKind::SpansLines);
        assert_eq!(warnings[0].cache_line, 1);
        assert!(warnings[0].to_string().contains("tick"));
    }
}

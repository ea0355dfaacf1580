// Mon Oct 19 2026 - Alex

use crate::structure::padding::{compute_gaps, PaddingGap};
use crate::structure::{Member, TypeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u64,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One aggregate type exactly as the compiler laid it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeLayout {
    pub name: String,
    pub kind: TypeKind,
    pub size: u64,
    pub align: u64,
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub is_packed: bool,
    /// Derived once at construction; consumers never recompute them.
    pub gaps: Vec<PaddingGap>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<SourceLocation>,
}

impl TypeLayout {
    /// Members are kept in the order given; gaps are computed immediately.
    pub fn new(name: &str, kind: TypeKind, size: u64, align: u64, members: Vec<Member>) -> Self {
        let gaps = compute_gaps(kind, size, &members);
        Self {
            name: name.to_string(),
            kind,
            size,
            align: align.max(1),
            members,
            is_packed: false,
            gaps,
            source: None,
        }
    }

    pub fn with_packed(mut self, is_packed: bool) -> Self {
        self.is_packed = is_packed;
        self
    }

    pub fn with_source(mut self, source: Option<SourceLocation>) -> Self {
        self.source = source;
        self
    }

    pub fn member(&self, key: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.key() == key)
    }

    pub fn has_unresolved(&self) -> bool {
        self.members.iter().any(|m| m.is_unresolved())
    }

    pub fn padding_bytes(&self) -> u64 {
        self.gaps.iter().map(|g| g.size).sum()
    }

    pub fn used_bytes(&self) -> u64 {
        self.size.saturating_sub(self.padding_bytes())
    }

    /// Compare everything that determines the in-memory layout, ignoring
    /// display-only details like type spellings and source locations.
    pub fn same_layout(&self, other: &TypeLayout) -> bool {
        self.kind == other.kind
            && self.size == other.size
            && self.align == other.align
            && self.is_packed == other.is_packed
            && self.members.len() == other.members.len()
            && self.members.iter().zip(&other.members).all(|(a, b)| {
                a.key() == b.key()
                    && a.offset == b.offset
                    && a.size == b.size
                    && a.bit_offset == b.bit_offset
                    && a.bit_width == b.bit_width
                    && a.array_len == b.array_len
                    && a.is_pointer == b.is_pointer
            })
    }

    /// Structural invariants every built layout satisfies.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if !self.is_packed && self.size % self.align != 0 {
            violations.push(format!("size {} is not a multiple of align {}", self.size, self.align));
        }

        if self.members.windows(2).any(|w| w[0].offset > w[1].offset) {
            violations.push("members are not sorted by offset".to_string());
        }

        match self.kind {
            TypeKind::Union => {
                for member in &self.members {
                    if member.offset != 0 {
                        violations.push(format!("union member {} starts at {}", member.name, member.offset));
                    }
                    if member.size > self.size {
                        violations.push(format!("union member {} exceeds union size", member.name));
                    }
                }
            }
            TypeKind::Enum => {}
            TypeKind::Struct | TypeKind::Class => {
                let mut spans: Vec<(u64, u64, &Member)> = self
                    .members
                    .iter()
                    .filter(|m| !m.is_unresolved())
                    .map(|m| {
                        let (start, end) = m.byte_span();
                        (start, end, m)
                    })
                    .filter(|(start, end, _)| end > start)
                    .collect();
                spans.sort_by_key(|(start, end, _)| (*start, *end));

                for pair in spans.windows(2) {
                    let (_, prev_end, prev) = pair[0];
                    let (next_start, _, next) = pair[1];
                    let shared_unit = prev.is_bitfield() && next.is_bitfield();
                    if prev_end > next_start && !shared_unit {
                        violations.push(format!("{} overlaps {}", prev.name, next.name));
                    }
                }
                if let Some((_, end, member)) = spans.iter().max_by_key(|(_, end, _)| *end) {
                    if *end > self.size {
                        violations.push(format!("{} ends past type size {}", member.name, self.size));
                    }
                }
            }
        }

        violations
    }
}

impl fmt::Display for TypeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (size {}, align {}", self.kind, self.name, self.size, self.align)?;
        if self.is_packed {
            write!(f, ", packed")?;
        }
        writeln!(f, ")")?;
        for member in &self.members {
            writeln!(f, "  {}", member)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn internal_padding() -> TypeLayout {
        TypeLayout::new(
            "InternalPadding",
            TypeKind::Struct,
            16,
            4,
            vec![
                Member::primitive("a", "char", 0, 1),
                Member::primitive("b", "int", 4, 4),
                Member::primitive("c", "char", 8, 1),
                Member::primitive("d", "int", 12, 4),
            ],
        )
    }

    #[test]
    fn test_padding_derived_on_construction() {
        let layout = internal_padding();
        assert_eq!(layout.used_bytes(), 10);
        assert_eq!(layout.padding_bytes(), 6);
        assert!(layout.check_invariants().is_empty());
    }

    #[test]
    fn test_overlap_violation() {
        let layout = TypeLayout::new(
            "Broken",
            TypeKind::Struct,
            8,
            4,
            vec![Member::primitive("a", "int", 0, 4), Member::primitive("b", "int", 2, 4)],
        );
        assert!(layout.check_invariants().iter().any(|v| v.contains("overlaps")));
    }

    #[test]
    fn test_union_violation() {
        let layout = TypeLayout::new(
            "U",
            TypeKind::Union,
            4,
            4,
            vec![Member::primitive("a", "int", 0, 4), Member::primitive("b", "int", 4, 4)],
        );
        assert!(!layout.check_invariants().is_empty());
    }

    #[test]
    fn test_same_layout_ignores_type_spelling() {
        let a = internal_padding();
        let mut b = internal_padding();
        b.members[1].type_name = "int32_t".to_string();
        assert!(a.same_layout(&b));
        b.members[1].offset = 8;
        assert!(!a.same_layout(&b));
    }
}

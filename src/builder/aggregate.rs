// Mon Oct 19 2026 - Alex

use crate::builder::resolver::{kind_of, scalar_align, TypeResolver};
use crate::error::{Diagnostic, Stage};
use crate::extract::{DieId, RawMember, RawType};
use crate::structure::alignment::{is_aligned, pow2_divisor};
use crate::structure::{Member, TypeKind, TypeLayout, TypeRef};
use gimli::RunTimeEndian;
use std::sync::Arc;

impl<'i> TypeResolver<'i> {
    /// Layout of a complete struct, class, union or enum DIE, built once and shared.
    ///
    /// Returns `None` for declarations, non-aggregates, and types currently being
    /// built further up the stack (a by-value cycle, which only broken DWARF has).
    pub fn aggregate_layout(&mut self, id: DieId) -> Option<Arc<TypeLayout>> {
        if let Some(layout) = self.layouts.get(&id) {
            return Some(Arc::clone(layout));
        }
        if self.in_progress.contains(&id) {
            return None;
        }

        let index = self.index;
        let raw = index.get(id)?;
        let kind = kind_of(raw.tag)?;
        let size = raw.byte_size?;
        if raw.is_declaration {
            return None;
        }

        self.in_progress.insert(id);
        let layout = match kind {
            TypeKind::Enum => {
                let align = raw.alignment.unwrap_or_else(|| scalar_align(size, self.address_size));
                TypeLayout::new(&layout_name(raw, kind), kind, size, align, Vec::new())
                    .with_source(raw.source.clone())
            }
            _ => self.build_aggregate(raw, kind, size),
        };
        self.in_progress.remove(&id);

        let layout = Arc::new(layout);
        self.layouts.insert(id, Arc::clone(&layout));
        Some(layout)
    }

    fn build_aggregate(&mut self, raw: &RawType, kind: TypeKind, size: u64) -> TypeLayout {
        let index = self.index;
        let name = layout_name(raw, kind);
        let mut members = Vec::new();
        let mut anonymous = 0usize;

        for raw_member in index.members_of(raw.id) {
            if raw_member.is_static {
                continue;
            }
            if raw_member.is_inheritance {
                self.flatten_base(&name, raw_member, &mut members);
                continue;
            }

            let member_name = match &raw_member.name {
                Some(n) => n.clone(),
                None => {
                    anonymous += 1;
                    format!("<anonymous#{}>", anonymous - 1)
                }
            };
            if let Some(member) = self.place(&name, kind, &member_name, raw_member) {
                members.push(member);
            }
        }

        members.sort_by_key(|m| m.offset);
        let (align, is_packed) = layout_alignment(raw.alignment, size, &members);
        log::debug!("{} {}: {} members, align {}", kind, name, members.len(), align);

        TypeLayout::new(&name, kind, size, align, members)
            .with_packed(is_packed)
            .with_source(raw.source.clone())
    }

    /// Resolve a member's type and normalize its position to a byte offset plus,
    /// for bitfields, a bit offset counted in memory order from that byte.
    fn place(&mut self, owner: &str, kind: TypeKind, name: &str, raw: &RawMember) -> Option<Member> {
        let resolved = self.resolve(raw.type_ref);
        if resolved.is_unresolved() {
            self.diagnostics
                .push(Diagnostic::unresolved(owner, name, &resolved.display));
        }

        let default_offset = match (raw.byte_offset, kind) {
            (Some(offset), _) => Some(offset),
            (None, TypeKind::Union) => Some(0),
            (None, _) => None,
        };

        let mut member = match raw.bit_size {
            Some(width) => {
                let storage = raw.byte_size.unwrap_or(resolved.size).max(1);
                let Some(storage_bits) = storage.checked_mul(8) else {
                    self.malformed(owner, name, raw, format!("storage unit of {} bytes is out of range", storage));
                    return None;
                };
                let (offset, bit) = match (raw.data_bit_offset, raw.legacy_bit_offset) {
                    (Some(dbo), _) => {
                        let container = raw.byte_offset.unwrap_or((dbo / 8 / storage) * storage);
                        let Some(bit) = container.checked_mul(8).and_then(|start| dbo.checked_sub(start)) else {
                            self.malformed(owner, name, raw, format!("bit offset {} precedes storage unit at {}", dbo, container));
                            return None;
                        };
                        (container, bit)
                    }
                    (None, Some(msb)) => {
                        let end = msb.checked_add(width).filter(|end| *end <= storage_bits);
                        let Some(end) = end else {
                            self.malformed(
                                owner,
                                name,
                                raw,
                                format!("{} bits at bit {} overflow a {}-byte storage unit", width, msb, storage),
                            );
                            return None;
                        };
                        let bit = match self.endian {
                            RunTimeEndian::Big => msb,
                            RunTimeEndian::Little => storage_bits - end,
                        };
                        (default_offset.unwrap_or(0), bit)
                    }
                    (None, None) => (default_offset.unwrap_or(0), 0),
                };
                Member::new(name, resolved.type_ref.clone(), offset, storage, resolved.align).with_bits(bit, width)
            }
            None => {
                let Some(offset) = default_offset else {
                    self.malformed(owner, name, raw, "member has no data location".to_string());
                    return None;
                };
                Member::new(name, resolved.type_ref.clone(), offset, resolved.size, resolved.align)
            }
        };

        member = member
            .with_type_name(&resolved.display)
            .with_atomic(resolved.is_atomic);
        if let Some(len) = resolved.array_len {
            member = member.with_array(len);
        }
        Some(member)
    }

    /// Inline a base class subobject's members at the base's offset, prefixing
    /// their origin with the base name so repeated bases stay distinct.
    fn flatten_base(&mut self, owner: &str, raw: &RawMember, members: &mut Vec<Member>) {
        let base_name = self.display_name(raw.type_ref, 0);
        let Some(offset) = raw.byte_offset else {
            self.malformed(owner, &base_name, raw, "base class has no constant offset".to_string());
            return;
        };

        let base = self
            .aggregate_target(raw.type_ref)
            .and_then(|id| self.aggregate_layout(id));
        match base {
            Some(base) => {
                for inherited in &base.members {
                    let Some(placed) = inherited.offset.checked_add(offset) else {
                        self.malformed(
                            owner,
                            &inherited.key(),
                            raw,
                            format!("{} at {} + base offset {} is out of range", inherited.name, inherited.offset, offset),
                        );
                        continue;
                    };
                    let mut member = inherited.clone();
                    member.offset = placed;
                    member.origin = Some(match &inherited.origin {
                        Some(path) => format!("{}::{}", base.name, path),
                        None => base.name.clone(),
                    });
                    members.push(member);
                }
            }
            None => {
                self.diagnostics
                    .push(Diagnostic::unresolved(owner, &base_name, &base_name));
                members.push(Member::new(
                    &base_name,
                    TypeRef::Unresolved { name: base_name.clone() },
                    offset,
                    0,
                    1,
                ));
            }
        }
    }

    fn malformed(&mut self, owner: &str, member: &str, raw: &RawMember, message: String) {
        let mut diagnostic = Diagnostic::malformed(raw.id.0, message).with_stage(Stage::Build);
        diagnostic.type_name = Some(owner.to_string());
        diagnostic.member = Some(member.to_string());
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

fn layout_name(raw: &RawType, kind: TypeKind) -> String {
    raw.qualified_name()
        .unwrap_or_else(|| format!("<anonymous {}>", kind))
}

/// Alignment of an aggregate and whether its layout shows signs of packing.
///
/// A type is packed when some member sits below its natural alignment or the
/// size is not a multiple of the largest member alignment. Packed types get the
/// largest alignment consistent with every member offset and the size.
pub(crate) fn layout_alignment(explicit: Option<u64>, size: u64, members: &[Member]) -> (u64, bool) {
    let placed = || members.iter().filter(|m| !m.is_unresolved());
    let natural = placed().map(|m| m.align).max().unwrap_or(1);

    let misaligned = placed()
        .filter(|m| !m.is_bitfield())
        .any(|m| !is_aligned(m.offset, m.align));
    let is_packed = misaligned || size % natural != 0;

    let align = match explicit {
        Some(align) => align,
        None if is_packed => placed()
            .filter(|m| !m.is_bitfield())
            .map(|m| pow2_divisor(m.offset, natural))
            .fold(pow2_divisor(size, natural), u64::min),
        None => natural,
    };
    (align.max(1), is_packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_alignment() {
        let members = vec![Member::primitive("a", "char", 0, 1), Member::primitive("b", "int", 4, 4)];
        assert_eq!(layout_alignment(None, 8, &members), (4, false));
    }

    #[test]
    fn test_packed_alignment() {
        let members = vec![
            Member::primitive("a", "char", 0, 1),
            Member::primitive("b", "int", 1, 4),
            Member::primitive("c", "short", 5, 2),
        ];
        assert_eq!(layout_alignment(None, 7, &members), (1, true));

        let pack2 = vec![Member::primitive("a", "char", 0, 1), Member::primitive("b", "int", 2, 4)];
        assert_eq!(layout_alignment(None, 6, &pack2), (2, true));
    }

    #[test]
    fn test_explicit_alignment_wins() {
        let members = vec![Member::primitive("a", "int", 0, 4)];
        assert_eq!(layout_alignment(Some(64), 64, &members), (64, false));
    }

    #[test]
    fn test_empty_type() {
        assert_eq!(layout_alignment(None, 1, &[]), (1, false));
    }
}

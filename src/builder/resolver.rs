// Mon Oct 19 2026 - Alex

use crate::error::Diagnostic;
use crate::extract::{DieId, RawMember, RawTag, RawType};
use crate::structure::alignment::natural_align;
use crate::structure::{ArrayLen, TypeKind, TypeLayout, TypeRef};
use ahash::{AHashMap, AHashSet};
use gimli::RunTimeEndian;
use indexmap::IndexMap;
use std::sync::Arc;

pub(crate) const MAX_TYPE_DEPTH: usize = 32;

/// Largest alignment a scalar gets. 32-bit ABIs like i386 cap 8-byte scalars at 4.
pub fn scalar_align(size: u64, address_size: u8) -> u64 {
    let cap = if address_size <= 4 { 4 } else { 16 };
    natural_align(size, cap)
}

pub(crate) fn kind_of(tag: RawTag) -> Option<TypeKind> {
    match tag {
        RawTag::Struct => Some(TypeKind::Struct),
        RawTag::Class => Some(TypeKind::Class),
        RawTag::Union => Some(TypeKind::Union),
        RawTag::Enum => Some(TypeKind::Enum),
        _ => None,
    }
}

/// Raw records of every unit, indexed for resolution.
#[derive(Debug, Default)]
pub struct TypeIndex {
    pub(crate) types: IndexMap<DieId, RawType>,
    members: AHashMap<DieId, Vec<RawMember>>,
    definitions: AHashMap<String, DieId>,
}

impl TypeIndex {
    pub fn insert_type(&mut self, ty: RawType) {
        if kind_of(ty.tag).is_some() && !ty.is_declaration && ty.byte_size.is_some() {
            if let Some(name) = ty.qualified_name() {
                self.definitions.entry(name).or_insert(ty.id);
            }
        }
        self.types.insert(ty.id, ty);
    }

    pub fn insert_member(&mut self, member: RawMember) {
        self.members.entry(member.parent).or_default().push(member);
    }

    pub fn get(&self, id: DieId) -> Option<&RawType> {
        self.types.get(&id)
    }

    /// Members in declaration order.
    pub fn members_of(&self, parent: DieId) -> &[RawMember] {
        self.members.get(&parent).map(|m| m.as_slice()).unwrap_or(&[])
    }

    /// First complete definition seen for a qualified name.
    pub fn definition(&self, name: &str) -> Option<DieId> {
        self.definitions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// What a member's type works out to after following typedefs, qualifiers,
/// declarations and array dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub type_ref: TypeRef,
    pub display: String,
    pub size: u64,
    pub align: u64,
    pub array_len: Option<ArrayLen>,
    pub is_atomic: bool,
}

impl ResolvedType {
    fn primitive(name: String, size: u64, align: u64) -> Self {
        Self {
            type_ref: TypeRef::Primitive { name: name.clone() },
            display: name,
            size,
            align: align.max(1),
            array_len: None,
            is_atomic: false,
        }
    }

    fn unresolved(name: String) -> Self {
        Self {
            type_ref: TypeRef::Unresolved { name: name.clone() },
            display: name,
            size: 0,
            align: 1,
            array_len: None,
            is_atomic: false,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.type_ref.is_unresolved()
    }
}

/// Resolves type DIEs into sizes, alignments and references, memoized per DIE.
pub struct TypeResolver<'i> {
    pub(crate) index: &'i TypeIndex,
    pub(crate) endian: RunTimeEndian,
    pub(crate) address_size: u8,
    resolved: AHashMap<DieId, ResolvedType>,
    pub(crate) layouts: AHashMap<DieId, Arc<TypeLayout>>,
    pub(crate) in_progress: AHashSet<DieId>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'i> TypeResolver<'i> {
    pub fn new(index: &'i TypeIndex, endian: RunTimeEndian, address_size: u8) -> Self {
        Self {
            index,
            endian,
            address_size,
            resolved: AHashMap::new(),
            layouts: AHashMap::new(),
            in_progress: AHashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Resolve the type a `DW_AT_type` points at; a missing reference is `void`.
    pub fn resolve(&mut self, id: Option<DieId>) -> ResolvedType {
        self.resolve_at(id, 0)
    }

    fn resolve_at(&mut self, id: Option<DieId>, depth: usize) -> ResolvedType {
        let Some(id) = id else {
            return ResolvedType::primitive("void".to_string(), 0, 1);
        };
        if let Some(hit) = self.resolved.get(&id) {
            return hit.clone();
        }
        if depth > MAX_TYPE_DEPTH {
            return ResolvedType::unresolved(format!("<type chain too deep at {}>", id));
        }

        let index = self.index;
        let Some(raw) = index.get(id) else {
            return ResolvedType::unresolved(format!("<missing type {}>", id));
        };

        let resolved = match raw.tag {
            RawTag::Base | RawTag::Unspecified => {
                let size = raw.byte_size.unwrap_or(0);
                ResolvedType::primitive(self.display_name(Some(id), depth), size, scalar_align(size, self.address_size))
            }
            RawTag::Pointer | RawTag::Reference | RawTag::RvalueReference => {
                let size = raw.byte_size.unwrap_or(u64::from(self.address_size));
                ResolvedType {
                    type_ref: TypeRef::Pointer {
                        pointee: self.display_name(raw.type_ref, depth + 1),
                    },
                    display: self.display_name(Some(id), depth),
                    size,
                    align: scalar_align(size, self.address_size),
                    array_len: None,
                    is_atomic: false,
                }
            }
            RawTag::PtrToMember => {
                let size = raw.byte_size.unwrap_or(u64::from(self.address_size));
                ResolvedType::primitive(self.display_name(Some(id), depth), size, scalar_align(size, self.address_size))
            }
            RawTag::Subroutine => ResolvedType::primitive(self.display_name(Some(id), depth), 0, 1),
            RawTag::Const | RawTag::Volatile | RawTag::Restrict | RawTag::Atomic | RawTag::Typedef => {
                let mut inner = self.resolve_at(raw.type_ref, depth + 1);
                inner.display = self.display_name(Some(id), depth);
                if raw.tag == RawTag::Atomic {
                    inner.is_atomic = true;
                    if let Some(size) = raw.byte_size {
                        inner.size = size;
                    }
                }
                inner
            }
            RawTag::Array => {
                let element = self.resolve_at(raw.type_ref, depth + 1);
                let len = if raw.dimensions.iter().any(|d| d.is_none()) {
                    ArrayLen::Unbounded
                } else {
                    ArrayLen::Fixed(raw.dimensions.iter().flatten().fold(1u64, |acc, n| acc.saturating_mul(*n)))
                };
                let size = match len {
                    ArrayLen::Unbounded => 0,
                    ArrayLen::Fixed(count) => match element.size.saturating_mul(count) {
                        0 => raw.byte_size.unwrap_or(0),
                        size => size,
                    },
                };
                ResolvedType {
                    type_ref: element.type_ref,
                    display: self.display_name(Some(id), depth),
                    size,
                    align: element.align,
                    array_len: Some(len),
                    is_atomic: element.is_atomic,
                }
            }
            RawTag::Struct | RawTag::Class | RawTag::Union | RawTag::Enum => self.resolve_record(raw, depth),
        };

        self.resolved.insert(id, resolved.clone());
        resolved
    }

    fn resolve_record(&mut self, raw: &RawType, depth: usize) -> ResolvedType {
        let Some(kind) = kind_of(raw.tag) else {
            return ResolvedType::unresolved(format!("<not a record {}>", raw.id));
        };
        let name = raw.qualified_name();

        if raw.is_declaration || raw.byte_size.is_none() {
            let definition = name.as_deref().and_then(|n| self.index.definition(n));
            return match definition {
                Some(def) if def != raw.id => self.resolve_at(Some(def), depth + 1),
                _ => ResolvedType::unresolved(name.unwrap_or_else(|| format!("<anonymous {}>", kind))),
            };
        }

        let size = raw.byte_size.unwrap_or(0);
        let (type_ref, display) = match &name {
            Some(name) => (TypeRef::Named { name: name.clone() }, name.clone()),
            None => (TypeRef::Anonymous { kind }, format!("<anonymous {}>", kind)),
        };
        let align = match kind {
            TypeKind::Enum => raw
                .alignment
                .unwrap_or_else(|| scalar_align(size, self.address_size)),
            _ => self.aggregate_layout(raw.id).map(|l| l.align).unwrap_or(1),
        };

        ResolvedType {
            type_ref,
            display,
            size,
            align,
            array_len: None,
            is_atomic: false,
        }
    }

    /// Complete aggregate a type reference denotes through typedefs and qualifiers.
    pub fn aggregate_target(&self, id: Option<DieId>) -> Option<DieId> {
        let mut current = id?;
        for _ in 0..MAX_TYPE_DEPTH {
            let raw = self.index.get(current)?;
            match raw.tag {
                RawTag::Typedef | RawTag::Const | RawTag::Volatile | RawTag::Atomic => current = raw.type_ref?,
                RawTag::Struct | RawTag::Class | RawTag::Union => {
                    if !raw.is_declaration && raw.byte_size.is_some() {
                        return Some(current);
                    }
                    return self.index.definition(&raw.qualified_name()?);
                }
                _ => return None,
            }
        }
        None
    }

    /// Human-readable spelling of a type, e.g. `const char*` or `Node<int>[4]`.
    pub fn display_name(&self, id: Option<DieId>, depth: usize) -> String {
        let Some(id) = id else {
            return "void".to_string();
        };
        if depth > MAX_TYPE_DEPTH {
            return "...".to_string();
        }
        let Some(raw) = self.index.get(id) else {
            return format!("<missing type {}>", id);
        };

        let inner = |this: &Self| this.display_name(raw.type_ref, depth + 1);
        match raw.tag {
            RawTag::Struct | RawTag::Class | RawTag::Union | RawTag::Enum => raw
                .qualified_name()
                .unwrap_or_else(|| format!("<anonymous {}>", kind_of(raw.tag).map(|k| k.to_string()).unwrap_or_default())),
            RawTag::Typedef => raw.qualified_name().unwrap_or_else(|| inner(self)),
            RawTag::Base | RawTag::Unspecified => raw.qualified_name().unwrap_or_else(|| "?".to_string()),
            RawTag::Pointer => format!("{}*", inner(self)),
            RawTag::Reference => format!("{}&", inner(self)),
            RawTag::RvalueReference => format!("{}&&", inner(self)),
            RawTag::PtrToMember => format!("{} (member pointer)", inner(self)),
            RawTag::Const => format!("const {}", inner(self)),
            RawTag::Volatile => format!("volatile {}", inner(self)),
            RawTag::Restrict => format!("{} restrict", inner(self)),
            RawTag::Atomic => format!("_Atomic {}", inner(self)),
            RawTag::Subroutine => "fn(...)".to_string(),
            RawTag::Array => {
                let dims: String = raw
                    .dimensions
                    .iter()
                    .map(|d| match d {
                        Some(n) => format!("[{}]", n),
                        None => "[]".to_string(),
                    })
                    .collect();
                format!("{}{}", inner(self), dims)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(id: u64, tag: RawTag, name: Option<&str>, size: Option<u64>, target: Option<u64>) -> RawType {
        let mut raw = RawType::new(DieId(id), tag);
        raw.name = name.map(|n| n.to_string());
        raw.byte_size = size;
        raw.type_ref = target.map(DieId);
        raw
    }

    fn index(types: Vec<RawType>) -> TypeIndex {
        let mut index = TypeIndex::default();
        for t in types {
            index.insert_type(t);
        }
        index
    }

    #[test]
    fn test_typedef_and_qualifiers() {
        let idx = index(vec![
            ty(1, RawTag::Base, Some("unsigned int"), Some(4), None),
            ty(2, RawTag::Typedef, Some("uint32_t"), None, Some(1)),
            ty(3, RawTag::Const, None, None, Some(2)),
            ty(4, RawTag::Atomic, None, None, Some(1)),
        ]);
        let mut resolver = TypeResolver::new(&idx, RunTimeEndian::Little, 8);

        let resolved = resolver.resolve(Some(DieId(3)));
        assert_eq!(resolved.display, "const uint32_t");
        assert_eq!(resolved.size, 4);
        assert_eq!(resolved.align, 4);
        assert_eq!(resolved.type_ref, TypeRef::Primitive { name: "unsigned int".to_string() });

        let atomic = resolver.resolve(Some(DieId(4)));
        assert!(atomic.is_atomic);
        assert_eq!(atomic.display, "_Atomic unsigned int");
    }

    #[test]
    fn test_pointer_to_incomplete_is_not_unresolved() {
        let mut opaque = ty(1, RawTag::Struct, Some("Opaque"), None, None);
        opaque.is_declaration = true;
        let idx = index(vec![opaque, ty(2, RawTag::Pointer, None, None, Some(1))]);
        let mut resolver = TypeResolver::new(&idx, RunTimeEndian::Little, 8);

        let ptr = resolver.resolve(Some(DieId(2)));
        assert_eq!(ptr.type_ref, TypeRef::Pointer { pointee: "Opaque".to_string() });
        assert_eq!(ptr.display, "Opaque*");
        assert_eq!(ptr.size, 8);

        let by_value = resolver.resolve(Some(DieId(1)));
        assert!(by_value.is_unresolved());
    }

    #[test]
    fn test_declaration_resolves_to_definition() {
        let mut decl = ty(1, RawTag::Struct, Some("Inner"), None, None);
        decl.is_declaration = true;
        let idx = index(vec![decl, ty(2, RawTag::Struct, Some("Inner"), Some(8), None)]);
        let mut resolver = TypeResolver::new(&idx, RunTimeEndian::Little, 8);

        let resolved = resolver.resolve(Some(DieId(1)));
        assert_eq!(resolved.type_ref, TypeRef::Named { name: "Inner".to_string() });
        assert_eq!(resolved.size, 8);
        assert_eq!(resolver.aggregate_target(Some(DieId(1))), Some(DieId(2)));
    }

    #[test]
    fn test_arrays() {
        let mut fixed = ty(2, RawTag::Array, None, None, Some(1));
        fixed.dimensions = vec![Some(2), Some(3)];
        let mut flexible = ty(3, RawTag::Array, None, None, Some(1));
        flexible.dimensions = vec![None];
        let idx = index(vec![ty(1, RawTag::Base, Some("short"), Some(2), None), fixed, flexible]);
        let mut resolver = TypeResolver::new(&idx, RunTimeEndian::Little, 8);

        let grid = resolver.resolve(Some(DieId(2)));
        assert_eq!(grid.display, "short[2][3]");
        assert_eq!(grid.size, 12);
        assert_eq!(grid.align, 2);
        assert_eq!(grid.array_len, Some(ArrayLen::Fixed(6)));

        let tail = resolver.resolve(Some(DieId(3)));
        assert_eq!(tail.display, "short[]");
        assert_eq!(tail.size, 0);
        assert_eq!(tail.array_len, Some(ArrayLen::Unbounded));
    }

    #[test]
    fn test_void_and_missing() {
        let idx = TypeIndex::default();
        let mut resolver = TypeResolver::new(&idx, RunTimeEndian::Little, 8);
        assert_eq!(resolver.resolve(None).display, "void");
        assert!(resolver.resolve(Some(DieId(99))).is_unresolved());
    }

    #[test]
    fn test_scalar_align_caps() {
        assert_eq!(scalar_align(8, 8), 8);
        assert_eq!(scalar_align(8, 4), 4);
        assert_eq!(scalar_align(16, 8), 16);
    }
}

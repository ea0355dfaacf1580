// Mon Oct 19 2026 - Alex

use crate::error::Diagnostic;
use crate::structure::SourceLocation;
use std::fmt;

/// Section offset of a DIE in `.debug_info`; unique across all units of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieId(pub u64);

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<0x{:x}>", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawTag {
    Struct,
    Class,
    Union,
    Enum,
    Base,
    Pointer,
    Reference,
    RvalueReference,
    PtrToMember,
    Const,
    Volatile,
    Restrict,
    Atomic,
    Typedef,
    Array,
    Subroutine,
    Unspecified,
}

impl RawTag {
    pub fn from_dwarf(tag: gimli::DwTag) -> Option<Self> {
        let raw = match tag {
            gimli::DW_TAG_structure_type => RawTag::Struct,
            gimli::DW_TAG_class_type => RawTag::Class,
            gimli::DW_TAG_union_type => RawTag::Union,
            gimli::DW_TAG_enumeration_type => RawTag::Enum,
            gimli::DW_TAG_base_type => RawTag::Base,
            gimli::DW_TAG_pointer_type => RawTag::Pointer,
            gimli::DW_TAG_reference_type => RawTag::Reference,
            gimli::DW_TAG_rvalue_reference_type => RawTag::RvalueReference,
            gimli::DW_TAG_ptr_to_member_type => RawTag::PtrToMember,
            gimli::DW_TAG_const_type => RawTag::Const,
            gimli::DW_TAG_volatile_type => RawTag::Volatile,
            gimli::DW_TAG_restrict_type => RawTag::Restrict,
            gimli::DW_TAG_atomic_type => RawTag::Atomic,
            gimli::DW_TAG_typedef => RawTag::Typedef,
            gimli::DW_TAG_array_type => RawTag::Array,
            gimli::DW_TAG_subroutine_type => RawTag::Subroutine,
            gimli::DW_TAG_unspecified_type => RawTag::Unspecified,
            _ => return None,
        };
        Some(raw)
    }

    /// Struct, class or union: a type with members of its own.
    pub fn is_aggregate(self) -> bool {
        matches!(self, RawTag::Struct | RawTag::Class | RawTag::Union)
    }

    pub fn is_indirection(self) -> bool {
        matches!(self, RawTag::Pointer | RawTag::Reference | RawTag::RvalueReference)
    }
}

/// One type DIE exactly as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct RawType {
    pub id: DieId,
    pub tag: RawTag,
    pub name: Option<String>,
    /// Enclosing namespaces, classes and functions, outermost first.
    pub scope: Vec<String>,
    pub byte_size: Option<u64>,
    pub alignment: Option<u64>,
    pub type_ref: Option<DieId>,
    /// One entry per array dimension; `None` when the bound is absent.
    pub dimensions: Vec<Option<u64>>,
    pub is_declaration: bool,
    pub source: Option<SourceLocation>,
}

impl RawType {
    pub fn new(id: DieId, tag: RawTag) -> Self {
        Self {
            id,
            tag,
            name: None,
            scope: Vec::new(),
            byte_size: None,
            alignment: None,
            type_ref: None,
            dimensions: Vec::new(),
            is_declaration: false,
            source: None,
        }
    }

    /// `ns::Outer::Inner` style name; `None` for anonymous types.
    pub fn qualified_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        if self.scope.is_empty() {
            return Some(name.to_string());
        }
        Some(format!("{}::{}", self.scope.join("::"), name))
    }
}

/// A data member or base-class subobject of an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMember {
    pub id: DieId,
    pub parent: DieId,
    pub name: Option<String>,
    pub type_ref: Option<DieId>,
    /// `DW_AT_data_member_location`, already evaluated.
    pub byte_offset: Option<u64>,
    /// Storage unit size of a DWARF 2-4 bitfield.
    pub byte_size: Option<u64>,
    pub bit_size: Option<u64>,
    pub data_bit_offset: Option<u64>,
    /// Legacy `DW_AT_bit_offset`, counted from the most significant bit.
    pub legacy_bit_offset: Option<u64>,
    pub is_inheritance: bool,
    /// Static data member; occupies no storage in the instance.
    pub is_static: bool,
}

impl RawMember {
    pub fn new(id: DieId, parent: DieId) -> Self {
        Self {
            id,
            parent,
            name: None,
            type_ref: None,
            byte_offset: None,
            byte_size: None,
            bit_size: None,
            data_bit_offset: None,
            legacy_bit_offset: None,
            is_inheritance: false,
            is_static: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Type(RawType),
    Member(RawMember),
}

impl RawRecord {
    pub fn id(&self) -> DieId {
        match self {
            RawRecord::Type(ty) => ty.id,
            RawRecord::Member(member) => member.id,
        }
    }
}

/// Everything extracted from one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct UnitRecords {
    pub index: usize,
    pub offset: u64,
    pub records: Vec<RawRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let mut ty = RawType::new(DieId(0x2a), RawTag::Struct);
        assert_eq!(ty.qualified_name(), None);

        ty.name = Some("Node<int>".to_string());
        assert_eq!(ty.qualified_name().as_deref(), Some("Node<int>"));

        ty.scope = vec!["app".to_string(), "(anonymous namespace)".to_string()];
        assert_eq!(ty.qualified_name().as_deref(), Some("app::(anonymous namespace)::Node<int>"));
    }

    #[test]
    fn test_tag_classes() {
        assert!(RawTag::from_dwarf(gimli::DW_TAG_class_type).unwrap().is_aggregate());
        assert!(RawTag::Reference.is_indirection());
        assert_eq!(RawTag::from_dwarf(gimli::DW_TAG_member), None);
        assert_eq!(DieId(0x10).to_string(), "<0x10>");
    }
}

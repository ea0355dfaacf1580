// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Union,
    Class,
    Enum,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Struct => write!(f, "struct"),
            TypeKind::Union => write!(f, "union"),
            TypeKind::Class => write!(f, "class"),
            TypeKind::Enum => write!(f, "enum"),
        }
    }
}

/// What a member's storage refers to.
///
/// Aggregates are linked by qualified name, never inlined, so a snapshot has no
/// ownership cycles even for self-referential node types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ref", rename_all = "snake_case")]
pub enum TypeRef {
    /// Base type, function type or anything else without its own layout entry.
    Primitive { name: String },
    /// By-value aggregate or enum present in the same snapshot.
    Named { name: String },
    /// Pointer or reference; contributes pointer width only.
    Pointer { pointee: String },
    /// Unnamed struct/union inlined into its parent.
    Anonymous { kind: TypeKind },
    /// Referenced type never defined in the binary.
    Unresolved { name: String },
}

impl TypeRef {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, TypeRef::Unresolved { .. })
    }

    pub fn target_name(&self) -> Option<&str> {
        match self {
            TypeRef::Primitive { name } | TypeRef::Named { name } | TypeRef::Unresolved { name } => {
                Some(name)
            }
            TypeRef::Pointer { pointee } => Some(pointee),
            TypeRef::Anonymous { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLen {
    Fixed(u64),
    /// Flexible array member (`T data[]`).
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub type_name: String,
    pub offset: u64,
    /// Storage size in bytes. Zero for flexible arrays and unresolved types.
    pub size: u64,
    pub align: u64,
    pub type_ref: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_len: Option<ArrayLen>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_pointer: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_atomic: bool,
    /// Base class a flattened member came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Member {
    pub fn new(name: &str, type_ref: TypeRef, offset: u64, size: u64, align: u64) -> Self {
        let type_name = match &type_ref {
            TypeRef::Pointer { pointee } => format!("{}*", pointee),
            TypeRef::Anonymous { kind } => format!("<anonymous {}>", kind),
            other => other.target_name().unwrap_or("?").to_string(),
        };
        Self {
            name: name.to_string(),
            type_name,
            offset,
            size,
            align: align.max(1),
            is_pointer: matches!(type_ref, TypeRef::Pointer { .. }),
            type_ref,
            bit_offset: None,
            bit_width: None,
            is_array: false,
            array_len: None,
            is_atomic: false,
            origin: None,
        }
    }

    pub fn primitive(name: &str, type_name: &str, offset: u64, size: u64) -> Self {
        let align = crate::structure::alignment::natural_align(size, 16);
        Self::new(name, TypeRef::Primitive { name: type_name.to_string() }, offset, size, align)
    }

    pub fn with_type_name(mut self, type_name: &str) -> Self {
        self.type_name = type_name.to_string();
        self
    }

    pub fn with_bits(mut self, bit_offset: u64, bit_width: u64) -> Self {
        self.bit_offset = Some(bit_offset);
        self.bit_width = Some(bit_width);
        self
    }

    pub fn with_array(mut self, len: ArrayLen) -> Self {
        self.is_array = true;
        self.array_len = Some(len);
        if len == ArrayLen::Unbounded {
            self.size = 0;
        }
        self
    }

    pub fn with_atomic(mut self, is_atomic: bool) -> Self {
        self.is_atomic = is_atomic;
        self
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    /// Name used to pair members across snapshots.
    pub fn key(&self) -> String {
        match &self.origin {
            Some(base) => format!("{}::{}", base, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_bitfield(&self) -> bool {
        self.bit_width.is_some()
    }

    pub fn is_unresolved(&self) -> bool {
        self.type_ref.is_unresolved()
    }

    pub fn is_flexible_array(&self) -> bool {
        self.array_len == Some(ArrayLen::Unbounded)
    }

    /// Bit range `[start, end)` relative to the start of the parent type.
    pub fn bit_span(&self) -> (u64, u64) {
        match self.bit_width {
            Some(width) => {
                let start = self.offset.saturating_mul(8).saturating_add(self.bit_offset.unwrap_or(0));
                (start, start.saturating_add(width))
            }
            None => {
                let start = self.offset.saturating_mul(8);
                (start, start.saturating_add(self.size.saturating_mul(8)))
            }
        }
    }

    /// Bytes actually touched by this member's bits.
    ///
    /// Computed in bytes so offsets near `u64::MAX` don't saturate in bit units.
    pub fn byte_span(&self) -> (u64, u64) {
        match self.bit_width {
            Some(width) => {
                let bit = self.bit_offset.unwrap_or(0);
                let start = self.offset.saturating_add(bit / 8);
                let end = self.offset.saturating_add(bit.saturating_add(width).div_ceil(8));
                (start, end)
            }
            None => (self.offset, self.offset.saturating_add(self.size)),
        }
    }

    pub fn end_offset(&self) -> u64 {
        self.byte_span().1
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ 0x{:x} ({} bytes)", self.type_name, self.key(), self.offset, self.size)?;
        if let (Some(bit), Some(width)) = (self.bit_offset, self.bit_width) {
            write!(f, " : {} bits at {}", width, bit)?;
        }
        Ok(())
    }
}

// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSeverity {
    Informational,
    Minor,
    Breaking,
}

impl fmt::Display for ChangeSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSeverity::Informational => write!(f, "info"),
            ChangeSeverity::Minor => write!(f, "minor"),
            ChangeSeverity::Breaking => write!(f, "breaking"),
        }
    }
}

/// One structural difference inside a type present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum MemberChange {
    MemberAdded {
        member: String,
        offset: u64,
        size: u64,
    },
    MemberRemoved {
        member: String,
        offset: u64,
        size: u64,
    },
    OffsetChanged {
        member: String,
        old_offset: u64,
        new_offset: u64,
    },
    SizeChanged {
        member: String,
        old_size: u64,
        new_size: u64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        old_bit_width: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        new_bit_width: Option<u64>,
    },
    BitfieldChanged {
        member: String,
        old_bit_offset: Option<u64>,
        new_bit_offset: Option<u64>,
    },
    Reordered {
        member: String,
        old_index: usize,
        new_index: usize,
    },
    /// Same position and width, different declared type.
    TypeChanged {
        member: String,
        old_type: String,
        new_type: String,
    },
    /// The type's size or alignment moved while every member stayed put.
    OpaqueLayoutChanged {
        old_size: u64,
        new_size: u64,
        old_align: u64,
        new_align: u64,
    },
}

impl MemberChange {
    pub fn severity(&self) -> ChangeSeverity {
        match self {
            MemberChange::Reordered { .. } => ChangeSeverity::Informational,
            MemberChange::MemberAdded { .. } | MemberChange::TypeChanged { .. } => ChangeSeverity::Minor,
            _ => ChangeSeverity::Breaking,
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.severity() == ChangeSeverity::Breaking
    }

    pub fn member(&self) -> Option<&str> {
        match self {
            MemberChange::MemberAdded { member, .. }
            | MemberChange::MemberRemoved { member, .. }
            | MemberChange::OffsetChanged { member, .. }
            | MemberChange::SizeChanged { member, .. }
            | MemberChange::BitfieldChanged { member, .. }
            | MemberChange::Reordered { member, .. }
            | MemberChange::TypeChanged { member, .. } => Some(member),
            MemberChange::OpaqueLayoutChanged { .. } => None,
        }
    }
}

fn bits(width: &Option<u64>) -> String {
    width.map(|w| format!(":{}", w)).unwrap_or_default()
}

impl fmt::Display for MemberChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberChange::MemberAdded { member, offset, size } => {
                write!(f, "{}: [NEW] @ 0x{:x} ({} bytes)", member, offset, size)
            }
            MemberChange::MemberRemoved { member, offset, size } => {
                write!(f, "{}: @ 0x{:x} ({} bytes) [REMOVED]", member, offset, size)
            }
            MemberChange::OffsetChanged { member, old_offset, new_offset } => write!(
                f,
                "{}: offset 0x{:x} -> 0x{:x} (delta: {:+})",
                member,
                old_offset,
                new_offset,
                *new_offset as i64 - *old_offset as i64
            ),
            MemberChange::SizeChanged {
                member,
                old_size,
                new_size,
                old_bit_width,
                new_bit_width,
            } => write!(
                f,
                "{}: size {}{} -> {}{}",
                member,
                old_size,
                bits(old_bit_width),
                new_size,
                bits(new_bit_width)
            ),
            MemberChange::BitfieldChanged {
                member,
                old_bit_offset,
                new_bit_offset,
            } => write!(
                f,
                "{}: bit offset {} -> {}",
                member,
                old_bit_offset.unwrap_or(0),
                new_bit_offset.unwrap_or(0)
            ),
            MemberChange::Reordered { member, old_index, new_index } => {
                write!(f, "{}: moved from position {} to {}", member, old_index, new_index)
            }
            MemberChange::TypeChanged {
                member,
                old_type,
                new_type,
            } => write!(f, "{}: type {} -> {}", member, old_type, new_type),
            MemberChange::OpaqueLayoutChanged {
                old_size,
                new_size,
                old_align,
                new_align,
            } => write!(
                f,
                "layout changed: size {} -> {}, align {} -> {}",
                old_size, new_size, old_align, new_align
            ),
        }
    }
}

// Mon Oct 19 2026 - Alex

pub mod alignment;
pub mod layout;
pub mod member;
pub mod padding;
pub mod serializer;
pub mod snapshot;

pub use layout::{SourceLocation, TypeLayout};
pub use member::{ArrayLen, Member, TypeKind, TypeRef};
pub use padding::{GapKind, PaddingGap};
pub use serializer::SnapshotStore;
pub use snapshot::{Snapshot, SnapshotMeta, EXTRACTOR_VERSION, SNAPSHOT_FORMAT_VERSION};

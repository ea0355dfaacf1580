// Mon Oct 19 2026 - Alex

pub mod attrs;
pub mod dwarf;
pub mod record;

pub use dwarf::{DwarfExtractor, Records, UnitHandle, ANONYMOUS_NAMESPACE};
pub use record::{DieId, RawMember, RawRecord, RawTag, RawType, UnitRecords};

pub type DwarfSlice<'a> = gimli::EndianSlice<'a, gimli::RunTimeEndian>;

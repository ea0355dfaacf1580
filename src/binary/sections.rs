// Mon Oct 19 2026 - Alex

use ahash::AHashMap;
use gimli::{RunTimeEndian, SectionId};
use std::borrow::Cow;

/// DWARF sections the extractor reads, by their ELF spelling.
pub const DWARF_SECTIONS: &[SectionId] = &[
    SectionId::DebugAbbrev,
    SectionId::DebugAddr,
    SectionId::DebugAranges,
    SectionId::DebugInfo,
    SectionId::DebugLine,
    SectionId::DebugLineStr,
    SectionId::DebugLoc,
    SectionId::DebugLocLists,
    SectionId::DebugRanges,
    SectionId::DebugRngLists,
    SectionId::DebugStr,
    SectionId::DebugStrOffsets,
    SectionId::DebugTypes,
];

/// Map a container-specific section name onto its canonical `.debug_*` name.
///
/// Mach-O spells sections `__debug_info` and truncates names to 16 bytes.
pub fn canonical_name(raw: &str) -> Option<&'static str> {
    DWARF_SECTIONS.iter().map(|id| id.name()).find(|name| {
        if raw == *name {
            return true;
        }
        let macho: String = format!("__{}", &name[1..]).chars().take(16).collect();
        raw == macho
    })
}

/// Whether a section name denotes a zlib-compressed legacy DWARF section.
pub fn is_legacy_compressed(raw: &str) -> bool {
    raw.starts_with(".zdebug_") || raw.starts_with("__zdebug_")
}

/// Raw debug sections of one binary plus the target properties needed to decode them.
#[derive(Debug, Clone)]
pub struct DebugSections<'a> {
    endian: RunTimeEndian,
    address_size: u8,
    sections: AHashMap<&'static str, Cow<'a, [u8]>>,
}

impl<'a> DebugSections<'a> {
    pub(crate) fn new(endian: RunTimeEndian, address_size: u8) -> Self {
        Self {
            endian,
            address_size,
            sections: AHashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, data: Cow<'a, [u8]>) {
        self.sections.insert(name, data);
    }

    /// Sections supplied directly, e.g. DWARF produced by a writer rather than a linker.
    pub fn from_raw<I>(endian: RunTimeEndian, address_size: u8, sections: I) -> DebugSections<'static>
    where
        I: IntoIterator<Item = (&'static str, Vec<u8>)>,
    {
        let mut out = DebugSections::new(endian, address_size);
        for (name, data) in sections {
            out.insert(name, Cow::Owned(data));
        }
        out
    }

    pub fn endian(&self) -> RunTimeEndian {
        self.endian
    }

    pub fn address_size(&self) -> u8 {
        self.address_size
    }

    /// Section contents, empty when absent.
    pub fn get(&self, name: &str) -> &[u8] {
        self.sections.get(name).map(|data| data.as_ref()).unwrap_or(&[])
    }

    pub fn has_debug_info(&self) -> bool {
        !self.get(SectionId::DebugInfo.name()).is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections.keys().copied()
    }
}

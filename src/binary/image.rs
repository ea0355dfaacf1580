// Mon Oct 19 2026 - Alex

use crate::binary::identity::{BinaryIdentity, IdentitySource};
use crate::binary::sections::{canonical_name, is_legacy_compressed, DebugSections};
use crate::error::{AuditError, Result, Stage};
use goblin::elf::note::NT_GNU_BUILD_ID;
use goblin::elf::section_header::SHF_COMPRESSED;
use goblin::elf::Elf;
use goblin::mach::load_command::CommandVariant;
use goblin::mach::{Mach, MachO};
use goblin::pe::PE;
use goblin::Object;
use gimli::RunTimeEndian;
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Elf,
    MachO,
    Pe,
}

enum ImageData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// A compiled binary held in memory for the duration of one extraction.
pub struct BinaryImage {
    data: ImageData,
    path: Option<PathBuf>,
}

impl BinaryImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file) }?;
        log::debug!("mapped {} ({} bytes)", path.as_ref().display(), mmap.len());
        Ok(Self {
            data: ImageData::Mapped(mmap),
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: ImageData::Owned(bytes),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            ImageData::Mapped(mmap) => mmap.as_ref(),
            ImageData::Owned(bytes) => bytes.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    fn parse(&self) -> Result<Object<'_>> {
        let bytes = self.bytes();
        if bytes.len() < 4 {
            return Err(AuditError::truncated(Stage::Load, 0, "file too small to carry a header"));
        }
        Object::parse(bytes).map_err(|e| AuditError::unsupported(Stage::Load, e.to_string()))
    }

    pub fn format(&self) -> Result<ContainerFormat> {
        match self.parse()? {
            Object::Elf(_) => Ok(ContainerFormat::Elf),
            Object::Mach(Mach::Binary(_)) => Ok(ContainerFormat::MachO),
            Object::PE(_) => Ok(ContainerFormat::Pe),
            other => Err(unsupported_object(&other)),
        }
    }

    /// Locate the DWARF sections. Slices borrow the mapped file; nothing is copied.
    pub fn debug_sections(&self) -> Result<DebugSections<'_>> {
        let bytes = self.bytes();
        let sections = match self.parse()? {
            Object::Elf(elf) => elf_sections(&elf, bytes)?,
            Object::Mach(Mach::Binary(macho)) => macho_sections(&macho)?,
            Object::PE(pe) => pe_sections(&pe, bytes)?,
            other => return Err(unsupported_object(&other)),
        };

        if !sections.has_debug_info() {
            return Err(AuditError::unsupported(Stage::Load, "binary carries no DWARF .debug_info"));
        }
        log::debug!("found debug sections: {:?}", sections.names().collect::<Vec<_>>());
        Ok(sections)
    }

    /// Build id or UUID when the linker embedded one, otherwise a content hash.
    pub fn identity(&self) -> BinaryIdentity {
        let bytes = self.bytes();
        match self.parse() {
            Ok(Object::Elf(elf)) => BinaryIdentity::from_bytes(bytes, elf_build_id(&elf, bytes)),
            Ok(Object::Mach(Mach::Binary(macho))) => {
                BinaryIdentity::from_bytes(bytes, macho_uuid(&macho)).with_source(IdentitySource::Uuid)
            }
            _ => BinaryIdentity::from_bytes(bytes, None),
        }
    }
}

fn unsupported_object(object: &Object<'_>) -> AuditError {
    let detail = match object {
        Object::Mach(Mach::Fat(_)) => "fat Mach-O archives are not supported; extract a single slice".to_string(),
        Object::Archive(_) => "static archives are not supported".to_string(),
        Object::Unknown(magic) => format!("unknown container magic 0x{:x}", magic),
        _ => "unsupported container format".to_string(),
    };
    AuditError::unsupported(Stage::Load, detail)
}

fn file_slice<'a>(bytes: &'a [u8], offset: u64, size: u64, name: &str) -> Result<&'a [u8]> {
    let start = usize::try_from(offset)
        .map_err(|_| AuditError::truncated(Stage::Load, offset, format!("{} offset out of range", name)))?;
    let end = offset
        .checked_add(size)
        .and_then(|end| usize::try_from(end).ok())
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            AuditError::truncated(Stage::Load, offset, format!("{} extends past end of file", name))
        })?;
    Ok(&bytes[start..end])
}

fn elf_sections<'a>(elf: &Elf<'a>, bytes: &'a [u8]) -> Result<DebugSections<'a>> {
    let endian = if elf.little_endian { RunTimeEndian::Little } else { RunTimeEndian::Big };
    let address_size = if elf.is_64 { 8 } else { 4 };
    let mut sections = DebugSections::new(endian, address_size);

    for header in &elf.section_headers {
        let raw = elf.shdr_strtab.get_at(header.sh_name).unwrap_or("");
        if is_legacy_compressed(raw) {
            return Err(AuditError::unsupported(
                Stage::Load,
                format!("section {} uses legacy zlib compression", raw),
            ));
        }
        let Some(name) = canonical_name(raw) else {
            continue;
        };
        if header.sh_flags & u64::from(SHF_COMPRESSED) != 0 {
            return Err(AuditError::unsupported(
                Stage::Load,
                format!("section {} is compressed (SHF_COMPRESSED)", raw),
            ));
        }
        if header.file_range().is_none() {
            continue;
        }
        let data = file_slice(bytes, header.sh_offset, header.sh_size, raw)?;
        sections.insert(name, Cow::Borrowed(data));
    }

    Ok(sections)
}

fn macho_sections<'a>(macho: &MachO<'a>) -> Result<DebugSections<'a>> {
    let endian = if macho.little_endian { RunTimeEndian::Little } else { RunTimeEndian::Big };
    let address_size = if macho.is_64 { 8 } else { 4 };
    let mut sections = DebugSections::new(endian, address_size);

    for segment in &macho.segments {
        let entries = segment
            .sections()
            .map_err(|e| AuditError::truncated(Stage::Load, segment.fileoff, e.to_string()))?;
        for (section, data) in entries {
            let raw = section.name().unwrap_or("");
            if is_legacy_compressed(raw) {
                return Err(AuditError::unsupported(
                    Stage::Load,
                    format!("section {} uses legacy zlib compression", raw),
                ));
            }
            if let Some(name) = canonical_name(raw) {
                sections.insert(name, Cow::Borrowed(data));
            }
        }
    }

    Ok(sections)
}

fn pe_sections<'a>(pe: &PE<'a>, bytes: &'a [u8]) -> Result<DebugSections<'a>> {
    let address_size = if pe.is_64 { 8 } else { 4 };
    let mut sections = DebugSections::new(RunTimeEndian::Little, address_size);

    for section in &pe.sections {
        let raw = match &section.real_name {
            Some(name) => name.clone(),
            None => section.name().unwrap_or("").to_string(),
        };
        let Some(name) = canonical_name(&raw) else {
            continue;
        };
        // Raw data is padded to the file alignment; the virtual size is exact.
        let size = match section.virtual_size {
            0 => section.size_of_raw_data,
            virtual_size => virtual_size.min(section.size_of_raw_data),
        };
        let data = file_slice(bytes, u64::from(section.pointer_to_raw_data), u64::from(size), &raw)?;
        sections.insert(name, Cow::Borrowed(data));
    }

    Ok(sections)
}

fn elf_build_id(elf: &Elf<'_>, bytes: &[u8]) -> Option<String> {
    let notes = elf.iter_note_sections(bytes, Some(".note.gnu.build-id"))?;
    notes
        .filter_map(|note| note.ok())
        .find(|note| note.n_type == NT_GNU_BUILD_ID)
        .map(|note| hex::encode(note.desc))
}

fn macho_uuid(macho: &MachO<'_>) -> Option<String> {
    macho.load_commands.iter().find_map(|lc| match &lc.command {
        CommandVariant::Uuid(cmd) => Some(hex::encode(cmd.uuid)),
        _ => None,
    })
}

// Mon Oct 19 2026 - Alex

use crate::binary::DebugSections;
use crate::error::{AuditError, Diagnostic, Result, Stage};
use crate::extract::attrs;
use crate::extract::record::{DieId, RawMember, RawRecord, RawTag, RawType, UnitRecords};
use crate::extract::DwarfSlice;
use crate::structure::SourceLocation;
use gimli::{AttributeValue, DebugInfoUnitHeadersIter, DebuggingInformationEntry, Dwarf, EndianSlice, RunTimeEndian, Unit, UnitHeader};
use rayon::prelude::*;

pub const ANONYMOUS_NAMESPACE: &str = "(anonymous namespace)";

/// Header of one compilation unit, in `.debug_info` order.
#[derive(Debug, Clone)]
pub struct UnitHandle<'a> {
    pub index: usize,
    pub offset: u64,
    header: UnitHeader<DwarfSlice<'a>>,
}

impl<'a> UnitHandle<'a> {
    pub fn version(&self) -> u16 {
        self.header.version()
    }
}

/// Reads type and member descriptors out of DWARF without interpreting them.
pub struct DwarfExtractor<'a> {
    dwarf: Dwarf<DwarfSlice<'a>>,
    endian: RunTimeEndian,
    address_size: u8,
}

impl<'a> DwarfExtractor<'a> {
    pub fn new(sections: &'a DebugSections<'_>) -> Result<Self> {
        let endian = sections.endian();
        let dwarf = Dwarf::load(|id: gimli::SectionId| -> std::result::Result<_, gimli::Error> {
            Ok(EndianSlice::new(sections.get(id.name()), endian))
        })
        .map_err(|e| AuditError::truncated(Stage::Extract, 0, e.to_string()))?;

        Ok(Self {
            dwarf,
            endian,
            address_size: sections.address_size(),
        })
    }

    pub fn endian(&self) -> RunTimeEndian {
        self.endian
    }

    pub fn address_size(&self) -> u8 {
        self.address_size
    }

    /// All compilation unit headers. Fails on the first unreadable header.
    pub fn units(&self) -> Result<Vec<UnitHandle<'a>>> {
        let mut cursor = UnitCursor::new(self.dwarf.units());
        let mut units = Vec::new();
        while let Some(unit) = cursor.advance()? {
            units.push(unit);
        }
        Ok(units)
    }

    pub fn extract_unit(&self, handle: &UnitHandle<'a>) -> Result<UnitRecords> {
        let unit = self.dwarf.unit(handle.header.clone()).map_err(|e| {
            AuditError::truncated(Stage::Extract, handle.offset, format!("unit {}: {}", handle.index, e))
        })?;

        let mut walker = UnitWalker {
            dwarf: &self.dwarf,
            unit: &unit,
            out: UnitRecords {
                index: handle.index,
                offset: handle.offset,
                ..UnitRecords::default()
            },
        };
        walker.walk()?;

        for diagnostic in &walker.out.diagnostics {
            log::warn!("{}", diagnostic);
        }
        log::debug!(
            "unit {} at 0x{:x}: {} records, {} diagnostics",
            handle.index,
            handle.offset,
            walker.out.records.len(),
            walker.out.diagnostics.len()
        );
        Ok(walker.out)
    }

    /// Lazy, sequential record stream; units are decoded on demand.
    pub fn records(&self) -> Records<'_, 'a> {
        Records {
            extractor: self,
            cursor: UnitCursor::new(self.dwarf.units()),
            pending: Vec::new().into_iter(),
            diagnostics: Vec::new(),
            done: false,
        }
    }

    /// Extract every unit in parallel. Output is in unit order regardless of scheduling.
    pub fn extract_all(&self) -> Result<Vec<UnitRecords>> {
        let units = self.units()?;
        let extracted = units
            .par_iter()
            .map(|unit| self.extract_unit(unit))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "extracted {} records from {} units",
            extracted.iter().map(|u| u.records.len()).sum::<usize>(),
            extracted.len()
        );
        Ok(extracted)
    }
}

struct UnitCursor<'a> {
    headers: DebugInfoUnitHeadersIter<DwarfSlice<'a>>,
    index: usize,
    next_offset: u64,
}

impl<'a> UnitCursor<'a> {
    fn new(headers: DebugInfoUnitHeadersIter<DwarfSlice<'a>>) -> Self {
        Self {
            headers,
            index: 0,
            next_offset: 0,
        }
    }

    fn advance(&mut self) -> Result<Option<UnitHandle<'a>>> {
        let header = match self.headers.next() {
            Ok(Some(header)) => header,
            Ok(None) => return Ok(None),
            Err(gimli::Error::UnknownVersion(version)) => {
                return Err(AuditError::unsupported(
                    Stage::Extract,
                    format!("DWARF version {} in unit at 0x{:x}", version, self.next_offset),
                ))
            }
            Err(e) => return Err(AuditError::truncated(Stage::Extract, self.next_offset, e.to_string())),
        };

        let offset = header
            .offset()
            .as_debug_info_offset()
            .map(|o| o.0 as u64)
            .unwrap_or(self.next_offset);
        if !(2..=5).contains(&header.version()) {
            return Err(AuditError::unsupported(
                Stage::Extract,
                format!("DWARF version {} in unit at 0x{:x}", header.version(), offset),
            ));
        }

        self.next_offset = offset + header.length_including_self() as u64;
        let handle = UnitHandle {
            index: self.index,
            offset,
            header,
        };
        self.index += 1;
        Ok(Some(handle))
    }
}

/// Iterator returned by [`DwarfExtractor::records`].
pub struct Records<'x, 'a> {
    extractor: &'x DwarfExtractor<'a>,
    cursor: UnitCursor<'a>,
    pending: std::vec::IntoIter<RawRecord>,
    diagnostics: Vec<Diagnostic>,
    done: bool,
}

impl Records<'_, '_> {
    /// Diagnostics from the units consumed so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl Iterator for Records<'_, '_> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }

            let unit = match self.cursor.advance() {
                Ok(Some(handle)) => self.extractor.extract_unit(&handle),
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => Err(e),
            };
            match unit {
                Ok(unit) => {
                    self.diagnostics.extend(unit.diagnostics);
                    self.pending = unit.records.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

struct Scope {
    depth: isize,
    name: Option<String>,
    aggregate: Option<DieId>,
}

struct UnitWalker<'w, 'a> {
    dwarf: &'w Dwarf<DwarfSlice<'a>>,
    unit: &'w Unit<DwarfSlice<'a>>,
    out: UnitRecords,
}

impl<'w, 'a> UnitWalker<'w, 'a> {
    fn walk(&mut self) -> Result<()> {
        let unit = self.unit;
        let mut entries = unit.entries();
        let mut scopes: Vec<Scope> = Vec::new();
        let mut depth: isize = 0;

        loop {
            let (delta, entry) = match entries.next_dfs() {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(e) => {
                    return Err(AuditError::truncated(
                        Stage::Extract,
                        self.out.offset,
                        format!("unreadable entry stream in unit {}: {}", self.out.index, e),
                    ))
                }
            };
            depth += delta;
            while scopes.last().is_some_and(|scope| scope.depth >= depth) {
                scopes.pop();
            }

            let id = self.die_id(entry);
            let tag = entry.tag();

            if tag == gimli::DW_TAG_namespace {
                let name = attrs::string(self.dwarf, self.unit, entry, gimli::DW_AT_name)
                    .unwrap_or(None)
                    .unwrap_or_else(|| ANONYMOUS_NAMESPACE.to_string());
                scopes.push(Scope { depth, name: Some(name), aggregate: None });
                continue;
            }

            if tag == gimli::DW_TAG_subprogram {
                let name = attrs::string(self.dwarf, self.unit, entry, gimli::DW_AT_name)
                    .unwrap_or(None)
                    .map(|name| format!("{}()", name));
                scopes.push(Scope { depth, name, aggregate: None });
                continue;
            }

            if tag == gimli::DW_TAG_member || tag == gimli::DW_TAG_inheritance {
                let parent = scopes
                    .last()
                    .filter(|scope| scope.depth == depth - 1)
                    .and_then(|scope| scope.aggregate);
                if let Some(parent) = parent {
                    match self.read_member(entry, id, parent) {
                        Ok(member) => self.out.records.push(RawRecord::Member(member)),
                        Err(e) => self.malformed(id, "member", e),
                    }
                }
                continue;
            }

            let Some(raw_tag) = RawTag::from_dwarf(tag) else {
                continue;
            };

            let scope_path: Vec<String> = scopes.iter().filter_map(|s| s.name.clone()).collect();
            match self.read_type(entry, id, raw_tag, scope_path) {
                Ok(ty) => {
                    if raw_tag.is_aggregate() {
                        scopes.push(Scope {
                            depth,
                            name: ty.name.clone(),
                            aggregate: Some(id),
                        });
                    }
                    self.out.records.push(RawRecord::Type(ty));
                }
                Err(e) => {
                    if raw_tag.is_aggregate() {
                        scopes.push(Scope { depth, name: None, aggregate: None });
                    }
                    self.malformed(id, "type", e);
                }
            }
        }

        Ok(())
    }

    fn die_id(&self, entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>) -> DieId {
        entry
            .offset()
            .to_debug_info_offset(&self.unit.header)
            .map(|o| DieId(o.0 as u64))
            .unwrap_or(DieId(self.out.offset + entry.offset().0 as u64))
    }

    fn malformed(&mut self, id: DieId, what: &str, error: gimli::Error) {
        self.out
            .diagnostics
            .push(Diagnostic::malformed(id.0, format!("skipped {} record: {}", what, error)));
    }

    fn reference(
        &self,
        entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>,
        name: gimli::DwAt,
    ) -> gimli::Result<Option<DieId>> {
        Ok(entry
            .attr_value(name)?
            .and_then(|value| attrs::die_ref(self.unit, value)))
    }

    fn read_type(
        &self,
        entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>,
        id: DieId,
        tag: RawTag,
        scope: Vec<String>,
    ) -> gimli::Result<RawType> {
        let mut ty = RawType::new(id, tag);
        ty.name = attrs::string(self.dwarf, self.unit, entry, gimli::DW_AT_name)?;
        ty.scope = scope;
        ty.byte_size = attrs::constant(entry.attr_value(gimli::DW_AT_byte_size)?);
        ty.alignment = attrs::constant(entry.attr_value(gimli::DW_AT_alignment)?);
        ty.type_ref = self.reference(entry, gimli::DW_AT_type)?;
        ty.is_declaration = attrs::flag(entry, gimli::DW_AT_declaration)?;
        if tag == RawTag::Array {
            ty.dimensions = self.array_dimensions(entry)?;
        }
        if tag.is_aggregate() || tag == RawTag::Enum {
            ty.source = self.source_location(entry)?;
        }
        Ok(ty)
    }

    fn array_dimensions(
        &self,
        entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>,
    ) -> gimli::Result<Vec<Option<u64>>> {
        let mut tree = self.unit.entries_tree(Some(entry.offset()))?;
        let root = tree.root()?;
        let mut children = root.children();
        let mut dimensions = Vec::new();

        while let Some(child) = children.next()? {
            let sub = child.entry();
            if sub.tag() != gimli::DW_TAG_subrange_type && sub.tag() != gimli::DW_TAG_enumeration_type {
                continue;
            }
            let count = match attrs::signed(sub.attr_value(gimli::DW_AT_count)?) {
                Some(count) if count >= 0 => Some(count as u64),
                Some(_) => None,
                None => match attrs::signed(sub.attr_value(gimli::DW_AT_upper_bound)?) {
                    // An upper bound of -1 is how compilers spell `T x[0]`.
                    Some(-1) => Some(0),
                    Some(upper) if upper >= 0 => {
                        let lower = attrs::constant(sub.attr_value(gimli::DW_AT_lower_bound)?).unwrap_or(0);
                        Some((upper as u64 + 1).saturating_sub(lower))
                    }
                    _ => None,
                },
            };
            dimensions.push(count);
        }

        if dimensions.is_empty() {
            dimensions.push(None);
        }
        Ok(dimensions)
    }

    fn read_member(
        &self,
        entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>,
        id: DieId,
        parent: DieId,
    ) -> gimli::Result<RawMember> {
        let mut member = RawMember::new(id, parent);
        member.name = attrs::string(self.dwarf, self.unit, entry, gimli::DW_AT_name)?;
        member.type_ref = self.reference(entry, gimli::DW_AT_type)?;
        member.byte_offset = match entry.attr_value(gimli::DW_AT_data_member_location)? {
            Some(AttributeValue::Exprloc(expr)) => attrs::member_offset(expr, self.unit.encoding()),
            other => attrs::constant(other),
        };
        member.byte_size = attrs::constant(entry.attr_value(gimli::DW_AT_byte_size)?);
        member.bit_size = attrs::constant(entry.attr_value(gimli::DW_AT_bit_size)?);
        member.data_bit_offset = attrs::constant(entry.attr_value(gimli::DW_AT_data_bit_offset)?);
        member.legacy_bit_offset = attrs::constant(entry.attr_value(gimli::DW_AT_bit_offset)?);
        member.is_inheritance = entry.tag() == gimli::DW_TAG_inheritance;
        member.is_static = attrs::flag(entry, gimli::DW_AT_external)?
            || (attrs::flag(entry, gimli::DW_AT_declaration)? && member.byte_offset.is_none());
        Ok(member)
    }

    fn source_location(
        &self,
        entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>,
    ) -> gimli::Result<Option<SourceLocation>> {
        let Some(file_index) = attrs::constant(entry.attr_value(gimli::DW_AT_decl_file)?) else {
            return Ok(None);
        };
        let Some(line) = attrs::constant(entry.attr_value(gimli::DW_AT_decl_line)?) else {
            return Ok(None);
        };
        let file = self
            .file_name(file_index)
            .unwrap_or_else(|| format!("file#{}", file_index));
        Ok(Some(SourceLocation { file, line }))
    }

    fn file_name(&self, index: u64) -> Option<String> {
        let program = self.unit.line_program.as_ref()?;
        let header = program.header();
        let file = header.file(index)?;
        let name = self
            .dwarf
            .attr_string(self.unit, file.path_name())
            .ok()?
            .to_string_lossy()
            .into_owned();

        let directory = file
            .directory(header)
            .and_then(|dir| self.dwarf.attr_string(self.unit, dir).ok())
            .map(|dir| dir.to_string_lossy().into_owned())
            .filter(|dir| !dir.is_empty());
        match directory {
            Some(dir) if !name.starts_with('/') => Some(format!("{}/{}", dir, name)),
            _ => Some(name),
        }
    }
}

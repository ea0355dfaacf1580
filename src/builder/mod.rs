// Mon Oct 19 2026 - Alex

//! Turns raw extractor records into a self-contained [`Snapshot`].

pub mod aggregate;
pub mod resolver;

pub use resolver::{scalar_align, ResolvedType, TypeIndex, TypeResolver};

use crate::error::{AuditError, Diagnostic, Result};
use crate::extract::{RawRecord, UnitRecords};
use crate::structure::{Snapshot, SnapshotMeta, TypeLayout};
use gimli::RunTimeEndian;
use itertools::Itertools;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Snapshot plus everything recovered along the way.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub snapshot: Snapshot,
    pub diagnostics: Vec<Diagnostic>,
}

/// Collects records unit by unit, then resolves them in one pass.
///
/// Ingest units in `.debug_info` order: when a name is defined more than once
/// the first definition is the one kept.
pub struct LayoutBuilder {
    index: TypeIndex,
    endian: RunTimeEndian,
    address_size: u8,
    diagnostics: Vec<Diagnostic>,
}

impl LayoutBuilder {
    pub fn new(endian: RunTimeEndian, address_size: u8) -> Self {
        Self {
            index: TypeIndex::default(),
            endian,
            address_size,
            diagnostics: Vec::new(),
        }
    }

    pub fn ingest(&mut self, unit: UnitRecords) {
        self.diagnostics.extend(unit.diagnostics);
        for record in unit.records {
            self.ingest_record(record);
        }
    }

    pub fn ingest_record(&mut self, record: RawRecord) {
        match record {
            RawRecord::Type(ty) => self.index.insert_type(ty),
            RawRecord::Member(member) => self.index.insert_member(member),
        }
    }

    pub fn type_count(&self) -> usize {
        self.index.len()
    }

    /// Build every named, complete aggregate and enum.
    ///
    /// Repeated definitions of one qualified name collapse when their layouts
    /// agree and fail with [`AuditError::ConflictingDefinition`] when they don't.
    pub fn finish(self, meta: SnapshotMeta) -> Result<BuildOutput> {
        let mut resolver = TypeResolver::new(&self.index, self.endian, self.address_size);
        let mut types: BTreeMap<String, TypeLayout> = BTreeMap::new();

        let candidates: Vec<_> = self
            .index
            .types
            .values()
            .filter(|ty| resolver::kind_of(ty.tag).is_some())
            .filter(|ty| !ty.is_declaration && ty.byte_size.is_some() && ty.name.is_some())
            .map(|ty| ty.id)
            .collect();

        for id in candidates {
            let Some(layout) = resolver.aggregate_layout(id) else {
                continue;
            };
            match types.entry(layout.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(TypeLayout::clone(&layout));
                }
                Entry::Occupied(slot) => {
                    if !slot.get().same_layout(&layout) {
                        return Err(AuditError::ConflictingDefinition {
                            name: layout.name.clone(),
                            first: Box::new(slot.get().clone()),
                            second: Box::new(TypeLayout::clone(&layout)),
                        });
                    }
                }
            }
        }

        let mut diagnostics = self.diagnostics;
        diagnostics.extend(resolver.into_diagnostics());
        let diagnostics: Vec<Diagnostic> = diagnostics.into_iter().unique().collect();

        log::info!(
            "built {} layouts from {} type records ({} diagnostics)",
            types.len(),
            self.index.len(),
            diagnostics.len()
        );

        Ok(BuildOutput {
            snapshot: Snapshot::from_layouts(meta, types.into_values()),
            diagnostics,
        })
    }
}

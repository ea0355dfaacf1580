// Mon Oct 19 2026 - Alex

//! Builders for synthetic DWARF, so layouts can be exercised without a C compiler.

use crate::binary::DebugSections;
use gimli::write::{AttributeValue, Dwarf, EndianVec, LineProgram, Reference, Sections, Unit, UnitEntryId, UnitId};
use gimli::{DwAt, DwTag, RunTimeEndian};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureDie {
    unit: UnitId,
    entry: UnitEntryId,
}

/// One or more compilation units under construction.
pub struct DwarfFixture {
    dwarf: Dwarf,
    encoding: gimli::Encoding,
    endian: RunTimeEndian,
    current: UnitId,
}

impl DwarfFixture {
    pub fn new(version: u16, address_size: u8) -> Self {
        let encoding = gimli::Encoding {
            format: gimli::Format::Dwarf32,
            version,
            address_size,
        };
        let mut dwarf = Dwarf::new();
        let current = dwarf.units.add(Unit::new(encoding, LineProgram::none()));
        Self {
            dwarf,
            encoding,
            endian: RunTimeEndian::Little,
            current,
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.endian = RunTimeEndian::Big;
        self
    }

    /// Start another compilation unit; later convenience helpers add to it.
    pub fn add_unit(&mut self) -> FixtureDie {
        self.current = self.dwarf.units.add(Unit::new(self.encoding, LineProgram::none()));
        self.root()
    }

    pub fn root(&self) -> FixtureDie {
        FixtureDie {
            unit: self.current,
            entry: self.dwarf.units.get(self.current).root(),
        }
    }

    pub fn add(&mut self, parent: FixtureDie, tag: DwTag) -> FixtureDie {
        let entry = self.dwarf.units.get_mut(parent.unit).add(parent.entry, tag);
        FixtureDie {
            unit: parent.unit,
            entry,
        }
    }

    pub fn set(&mut self, die: FixtureDie, name: DwAt, value: AttributeValue) {
        self.dwarf
            .units
            .get_mut(die.unit)
            .get_mut(die.entry)
            .set(name, value);
    }

    /// Reference attribute; crosses units with `DW_FORM_ref_addr` when needed.
    pub fn set_ref(&mut self, die: FixtureDie, name: DwAt, target: FixtureDie) {
        let value = if die.unit == target.unit {
            AttributeValue::UnitRef(target.entry)
        } else {
            AttributeValue::DebugInfoRef(Reference::Entry(target.unit, target.entry))
        };
        self.set(die, name, value);
    }

    pub fn set_name(&mut self, die: FixtureDie, name: &str) {
        self.set(die, gimli::DW_AT_name, AttributeValue::String(name.as_bytes().to_vec()));
    }

    pub fn base_type(&mut self, name: &str, size: u64) -> FixtureDie {
        let die = self.add(self.root(), gimli::DW_TAG_base_type);
        self.set_name(die, name);
        self.set(die, gimli::DW_AT_byte_size, AttributeValue::Udata(size));
        self.set(die, gimli::DW_AT_encoding, AttributeValue::Encoding(gimli::DW_ATE_signed));
        die
    }

    pub fn pointer_to(&mut self, target: Option<FixtureDie>) -> FixtureDie {
        let die = self.add(self.root(), gimli::DW_TAG_pointer_type);
        self.set(die, gimli::DW_AT_byte_size, AttributeValue::Udata(u64::from(self.encoding.address_size)));
        if let Some(target) = target {
            self.set_ref(die, gimli::DW_AT_type, target);
        }
        die
    }

    /// `const`, `volatile`, `_Atomic` and other single-operand type modifiers.
    pub fn modifier(&mut self, tag: DwTag, target: FixtureDie) -> FixtureDie {
        let die = self.add(self.root(), tag);
        self.set_ref(die, gimli::DW_AT_type, target);
        die
    }

    pub fn typedef(&mut self, name: &str, target: FixtureDie) -> FixtureDie {
        let die = self.modifier(gimli::DW_TAG_typedef, target);
        self.set_name(die, name);
        die
    }

    /// Array type with one subrange per dimension; `None` leaves the bound out.
    pub fn array(&mut self, element: FixtureDie, dims: &[Option<u64>]) -> FixtureDie {
        let die = self.modifier(gimli::DW_TAG_array_type, element);
        for dim in dims {
            let sub = self.add(die, gimli::DW_TAG_subrange_type);
            if let Some(count) = dim {
                self.set(sub, gimli::DW_AT_count, AttributeValue::Udata(*count));
            }
        }
        die
    }

    pub fn aggregate(&mut self, parent: FixtureDie, tag: DwTag, name: Option<&str>, size: u64) -> FixtureDie {
        let die = self.add(parent, tag);
        if let Some(name) = name {
            self.set_name(die, name);
        }
        self.set(die, gimli::DW_AT_byte_size, AttributeValue::Udata(size));
        die
    }

    pub fn structure(&mut self, name: &str, size: u64) -> FixtureDie {
        self.aggregate(self.root(), gimli::DW_TAG_structure_type, Some(name), size)
    }

    /// Forward declaration without size or members.
    pub fn declaration(&mut self, tag: DwTag, name: &str) -> FixtureDie {
        let die = self.add(self.root(), tag);
        self.set_name(die, name);
        self.set(die, gimli::DW_AT_declaration, AttributeValue::Flag(true));
        die
    }

    pub fn namespace(&mut self, parent: FixtureDie, name: Option<&str>) -> FixtureDie {
        let die = self.add(parent, gimli::DW_TAG_namespace);
        if let Some(name) = name {
            self.set_name(die, name);
        }
        die
    }

    pub fn member(&mut self, parent: FixtureDie, name: &str, ty: FixtureDie, offset: u64) -> FixtureDie {
        let die = self.add(parent, gimli::DW_TAG_member);
        self.set_name(die, name);
        self.set_ref(die, gimli::DW_AT_type, ty);
        self.set(die, gimli::DW_AT_data_member_location, AttributeValue::Udata(offset));
        die
    }

    /// Bitfield described DWARF 4+ style, by absolute `DW_AT_data_bit_offset`.
    pub fn bitfield(&mut self, parent: FixtureDie, name: &str, ty: FixtureDie, data_bit_offset: u64, bits: u64) -> FixtureDie {
        let die = self.add(parent, gimli::DW_TAG_member);
        self.set_name(die, name);
        self.set_ref(die, gimli::DW_AT_type, ty);
        self.set(die, gimli::DW_AT_data_bit_offset, AttributeValue::Udata(data_bit_offset));
        self.set(die, gimli::DW_AT_bit_size, AttributeValue::Udata(bits));
        die
    }

    /// Bitfield described DWARF 2/3 style: storage unit offset plus a bit offset
    /// counted from the most significant bit of that unit.
    #[allow(clippy::too_many_arguments)]
    pub fn legacy_bitfield(
        &mut self,
        parent: FixtureDie,
        name: &str,
        ty: FixtureDie,
        unit_offset: u64,
        unit_size: u64,
        msb_bit_offset: u64,
        bits: u64,
    ) -> FixtureDie {
        let die = self.member(parent, name, ty, unit_offset);
        self.set(die, gimli::DW_AT_byte_size, AttributeValue::Udata(unit_size));
        self.set(die, gimli::DW_AT_bit_offset, AttributeValue::Udata(msb_bit_offset));
        self.set(die, gimli::DW_AT_bit_size, AttributeValue::Udata(bits));
        die
    }

    pub fn inheritance(&mut self, parent: FixtureDie, base: FixtureDie, offset: u64) -> FixtureDie {
        let die = self.add(parent, gimli::DW_TAG_inheritance);
        self.set_ref(die, gimli::DW_AT_type, base);
        self.set(die, gimli::DW_AT_data_member_location, AttributeValue::Udata(offset));
        die
    }

    /// Struct in the current unit with plain members at fixed offsets.
    pub fn struct_of(&mut self, name: &str, size: u64, members: &[(&str, FixtureDie, u64)]) -> FixtureDie {
        let die = self.structure(name, size);
        for (member, ty, offset) in members {
            self.member(die, member, *ty, *offset);
        }
        die
    }

    /// Serialize every unit into raw debug sections.
    pub fn build(&mut self) -> Result<DebugSections<'static>, gimli::write::Error> {
        let mut sections = Sections::new(EndianVec::new(self.endian));
        self.dwarf.write(&mut sections)?;

        let mut raw = Vec::new();
        sections.for_each(|id, data| {
            if !data.slice().is_empty() {
                raw.push((id.name(), data.slice().to_vec()));
            }
            Ok::<(), gimli::write::Error>(())
        })?;
        Ok(DebugSections::from_raw(self.endian, self.encoding.address_size, raw))
    }
}

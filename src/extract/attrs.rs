// Mon Oct 19 2026 - Alex

use crate::extract::record::DieId;
use crate::extract::DwarfSlice;
use gimli::{AttributeValue, DebuggingInformationEntry, Dwarf, Expression, Operation, Unit};

/// Unsigned constant in any of the data forms. Negative values yield `None`.
pub fn constant(value: Option<AttributeValue<DwarfSlice<'_>>>) -> Option<u64> {
    match value? {
        AttributeValue::Udata(v) => Some(v),
        AttributeValue::Data1(v) => Some(u64::from(v)),
        AttributeValue::Data2(v) => Some(u64::from(v)),
        AttributeValue::Data4(v) => Some(u64::from(v)),
        AttributeValue::Data8(v) => Some(v),
        AttributeValue::Sdata(v) if v >= 0 => Some(v as u64),
        AttributeValue::FileIndex(v) => Some(v),
        _ => None,
    }
}

pub fn signed(value: Option<AttributeValue<DwarfSlice<'_>>>) -> Option<i64> {
    match value? {
        AttributeValue::Sdata(v) => Some(v),
        other => constant(Some(other)).and_then(|v| i64::try_from(v).ok()),
    }
}

pub fn flag(entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'_>>, name: gimli::DwAt) -> gimli::Result<bool> {
    Ok(matches!(entry.attr_value(name)?, Some(AttributeValue::Flag(true))))
}

pub fn string<'a>(
    dwarf: &Dwarf<DwarfSlice<'a>>,
    unit: &Unit<DwarfSlice<'a>>,
    entry: &DebuggingInformationEntry<'_, '_, DwarfSlice<'a>>,
    name: gimli::DwAt,
) -> gimli::Result<Option<String>> {
    match entry.attr_value(name)? {
        Some(value) => {
            let text = dwarf.attr_string(unit, value)?;
            Ok(Some(text.to_string_lossy().into_owned()))
        }
        None => Ok(None),
    }
}

/// Global id of the DIE a reference attribute points at.
pub fn die_ref(unit: &Unit<DwarfSlice<'_>>, value: AttributeValue<DwarfSlice<'_>>) -> Option<DieId> {
    match value {
        AttributeValue::UnitRef(offset) => offset
            .to_debug_info_offset(&unit.header)
            .map(|o| DieId(o.0 as u64)),
        AttributeValue::DebugInfoRef(offset) => Some(DieId(offset.0 as u64)),
        _ => None,
    }
}

/// Byte offset described by a `DW_AT_data_member_location` expression.
pub fn member_offset(expr: Expression<DwarfSlice<'_>>, encoding: gimli::Encoding) -> Option<u64> {
    simple_offset(expr.clone(), encoding).or_else(|| evaluate_offset(expr, encoding))
}

/// `DW_OP_plus_uconst N` or `DW_OP_constu N` on their own.
fn simple_offset(expr: Expression<DwarfSlice<'_>>, encoding: gimli::Encoding) -> Option<u64> {
    let mut ops = expr.operations(encoding);
    let value = match ops.next().ok()?? {
        Operation::PlusConstant { value } => value,
        Operation::UnsignedConstant { value } => value,
        _ => return None,
    };
    match ops.next() {
        Ok(None) => Some(value),
        _ => None,
    }
}

fn evaluate_offset(expr: Expression<DwarfSlice<'_>>, encoding: gimli::Encoding) -> Option<u64> {
    let mut eval = expr.evaluation(encoding);
    eval.set_initial_value(0);

    let mut state = eval.evaluate().ok()?;
    loop {
        match state {
            gimli::EvaluationResult::Complete => break,
            gimli::EvaluationResult::RequiresRelocatedAddress(address) => {
                state = eval.resume_with_relocated_address(address).ok()?;
            }
            _ => return None,
        }
    }

    let mask = match encoding.address_size {
        8 => u64::MAX,
        size @ 1..=7 => (1u64 << (u64::from(size) * 8)) - 1,
        _ => return None,
    };
    let pieces = eval.result();
    match &pieces.first()?.location {
        gimli::Location::Address { address } => Some(*address),
        gimli::Location::Value { value } => value.to_u64(mask).ok(),
        _ => None,
    }
}

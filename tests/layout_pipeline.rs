// Mon Oct 19 2026 - Alex

use struct_layout_auditor::analysis::{reorder_candidate, ViolationKind};
use struct_layout_auditor::structure::{GapKind, TypeKind, TypeRef};
use struct_layout_auditor::testing::DwarfFixture;
use struct_layout_auditor::{AuditConfig, AuditPipeline, BinaryIdentity, BuildOutput, SnapshotStore, TypeBudget};

fn pipeline(config: AuditConfig) -> AuditPipeline {
    AuditPipeline::new(config.with_max_threads(2)).unwrap()
}

fn extract(pipeline: &AuditPipeline, fixture: &mut DwarfFixture) -> BuildOutput {
    let sections = fixture.build().unwrap();
    pipeline.snapshot_from_sections(&sections, None).unwrap()
}

/// The C fixtures, as a 64-bit little-endian DWARF 4 unit.
fn c_fixtures() -> DwarfFixture {
    let mut f = DwarfFixture::new(4, 8);
    let int = f.base_type("int", 4);
    let ch = f.base_type("char", 1);
    let long = f.base_type("long", 8);

    f.struct_of("NoPadding", 12, &[("a", int, 0), ("b", int, 4), ("c", int, 8)]);
    f.struct_of(
        "InternalPadding",
        16,
        &[("a", ch, 0), ("b", int, 4), ("c", ch, 8), ("d", int, 12)],
    );
    f.struct_of(
        "HotOrder",
        64,
        &[
            ("head", long, 0),
            ("tail", long, 8),
            ("count", long, 16),
            ("mask", long, 24),
            ("r0", long, 32),
            ("r1", long, 40),
            ("r2", long, 48),
            ("r3", long, 56),
        ],
    );
    f.struct_of("PackedHeader", 5, &[("len", int, 0), ("tag", ch, 4)]);
    f.struct_of("UnpackedHeader", 8, &[("len", int, 0), ("tag", ch, 4)]);
    f
}

#[test]
fn test_no_padding_report() {
    let pipeline = pipeline(AuditConfig::new());
    let out = extract(&pipeline, &mut c_fixtures());
    let reports = pipeline.analyze(&out.snapshot).unwrap();

    let report = reports.iter().find(|r| r.name == "NoPadding").unwrap();
    assert_eq!(report.size, 12);
    assert_eq!(report.padding_bytes, 0);
    assert!(!report.reorderable);
    assert!(report.reorder.is_none());
}

#[test]
fn test_internal_padding_report() {
    let pipeline = pipeline(AuditConfig::new());
    let out = extract(&pipeline, &mut c_fixtures());
    let reports = pipeline.analyze(&out.snapshot).unwrap();

    let report = reports.iter().find(|r| r.name == "InternalPadding").unwrap();
    assert_eq!((report.size, report.used_bytes, report.padding_bytes), (16, 10, 6));
    assert!(report.reorderable);
    assert!(report.excessive_padding);

    let reorder = report.reorder.as_ref().unwrap();
    assert_eq!(reorder.candidate_size, 12);
    assert_eq!(reorder.savings_bytes, 4);
    let order: Vec<&str> = reorder.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["b", "d", "a", "c"]);
}

#[test]
fn test_hot_order_fits_one_line() {
    let pipeline = pipeline(
        AuditConfig::new()
            .with_cache_line_size(64)
            .with_hot_path_tags(["HotOrder"]),
    );
    let out = extract(&pipeline, &mut c_fixtures());
    let reports = pipeline.analyze(&out.snapshot).unwrap();

    let hot = reports.iter().find(|r| r.name == "HotOrder").unwrap();
    assert!(hot.is_hot);
    assert!(!hot.cache_unfriendly);
    assert_eq!(hot.cache_lines_spanned, 1);
    assert!(reports.iter().filter(|r| r.name != "HotOrder").all(|r| !r.is_hot));
}

#[test]
fn test_packed_versus_unpacked_header() {
    let pipeline = pipeline(AuditConfig::new());
    let out = extract(&pipeline, &mut c_fixtures());
    let snapshot = &out.snapshot;

    let packed = snapshot.get("PackedHeader").unwrap();
    let unpacked = snapshot.get("UnpackedHeader").unwrap();
    assert!(packed.size < unpacked.size);
    assert!(packed.is_packed);
    assert!(!unpacked.is_packed);
    assert_eq!(packed.padding_bytes(), 0);

    assert_eq!(unpacked.padding_bytes(), 3);
    assert_eq!(unpacked.gaps.len(), 1);
    assert_eq!(unpacked.gaps[0].kind, GapKind::Tail);
    assert_eq!((unpacked.gaps[0].offset, unpacked.gaps[0].size), (5, 3));

    let reports = pipeline.analyze(snapshot).unwrap();
    let packed_report = reports.iter().find(|r| r.name == "PackedHeader").unwrap();
    assert!(packed_report.is_packed);
    assert!(!packed_report.reorderable);
}

#[test]
fn test_every_layout_satisfies_invariants() {
    let pipeline = pipeline(AuditConfig::new());
    let out = extract(&pipeline, &mut c_fixtures());
    for layout in out.snapshot.iter() {
        assert!(layout.check_invariants().is_empty(), "{}: {:?}", layout.name, layout.check_invariants());
    }
}

#[test]
fn test_reextraction_is_byte_identical() {
    let pipeline = pipeline(AuditConfig::new());
    let first = extract(&pipeline, &mut c_fixtures()).snapshot.to_json().unwrap();
    let second = extract(&pipeline, &mut c_fixtures()).snapshot.to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_greedy_never_adds_padding() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = c_fixtures();
    let ch = f.base_type("char", 1);
    let short = f.base_type("short", 2);
    let double = f.base_type("double", 8);
    f.struct_of(
        "Mixed",
        32,
        &[("a", ch, 0), ("b", double, 8), ("c", short, 16), ("d", ch, 18), ("e", double, 24)],
    );
    f.struct_of("Tight", 16, &[("x", double, 0), ("y", short, 8), ("z", ch, 10)]);

    let out = extract(&pipeline, &mut f);
    for layout in out.snapshot.iter() {
        if let Some(candidate) = reorder_candidate(layout) {
            assert!(
                candidate.candidate_padding <= layout.padding_bytes(),
                "{} grew from {} to {}",
                layout.name,
                layout.padding_bytes(),
                candidate.candidate_padding
            );
        }
    }
}

#[test]
fn test_templates_and_nested_names() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = DwarfFixture::new(4, 8);
    let int = f.base_type("int", 4);
    let long = f.base_type("long", 8);
    let ns = f.namespace(f.root(), Some("geo"));
    let point_int = f.aggregate(ns, gimli::DW_TAG_structure_type, Some("Point<int>"), 8);
    f.member(point_int, "x", int, 0);
    f.member(point_int, "y", int, 4);
    let point_long = f.aggregate(ns, gimli::DW_TAG_structure_type, Some("Point<long>"), 16);
    f.member(point_long, "x", long, 0);
    f.member(point_long, "y", long, 8);

    let out = extract(&pipeline, &mut f);
    let names: Vec<&str> = out.snapshot.names().collect();
    assert_eq!(names, vec!["geo::Point<int>", "geo::Point<long>"]);
    assert_eq!(out.snapshot.get("geo::Point<long>").unwrap().size, 16);
}

#[test]
fn test_bitfields_share_storage() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = DwarfFixture::new(5, 8);
    let uint = f.base_type("unsigned int", 4);
    let ch = f.base_type("char", 1);
    let flags = f.structure("Flags", 8);
    f.bitfield(flags, "ready", uint, 0, 1);
    f.bitfield(flags, "mode", uint, 1, 3);
    f.member(flags, "tag", ch, 4);

    let out = extract(&pipeline, &mut f);
    let layout = out.snapshot.get("Flags").unwrap();
    let mode = layout.member("mode").unwrap();
    assert_eq!((mode.offset, mode.bit_offset, mode.bit_width), (0, Some(1), Some(3)));
    assert_eq!(layout.used_bytes(), 2);
    assert_eq!(layout.padding_bytes(), 6);

    let candidate = reorder_candidate(layout).unwrap();
    assert!(!candidate.improves());
}

#[test]
fn test_flexible_array_is_zero_sized() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = DwarfFixture::new(4, 8);
    let int = f.base_type("int", 4);
    let ch = f.base_type("char", 1);
    let tail = f.array(ch, &[None]);
    f.struct_of("Message", 8, &[("kind", ch, 0), ("len", int, 4), ("body", tail, 8)]);

    let out = extract(&pipeline, &mut f);
    let layout = out.snapshot.get("Message").unwrap();
    assert_eq!(layout.padding_bytes(), 3);

    let candidate = reorder_candidate(layout).unwrap();
    assert_eq!(candidate.members.last().map(|m| m.name.as_str()), Some("body"));
}

#[test]
fn test_inheritance_keeps_base_prefix() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = DwarfFixture::new(4, 8);
    let int = f.base_type("int", 4);
    let ch = f.base_type("char", 1);
    let base = f.struct_of("Shape", 8, &[("id", int, 0), ("flags", ch, 4)]);
    let circle = f.aggregate(f.root(), gimli::DW_TAG_class_type, Some("Circle"), 12);
    f.inheritance(circle, base, 0);
    f.member(circle, "radius", int, 8);

    let out = extract(&pipeline, &mut f);
    let circle = out.snapshot.get("Circle").unwrap();
    assert_eq!(circle.kind, TypeKind::Class);
    let keys: Vec<String> = circle.members.iter().map(|m| m.key()).collect();
    assert_eq!(keys, vec!["Shape::id", "Shape::flags", "radius"]);
    assert_eq!(circle.padding_bytes(), 3);
}

#[test]
fn test_pointer_members_link_by_name() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = DwarfFixture::new(4, 8);
    let int = f.base_type("int", 4);
    let inner = f.struct_of("Inner", 8, &[("x", int, 0), ("y", int, 4)]);
    let ptr = f.pointer_to(Some(inner));
    f.struct_of("Outer", 16, &[("inner", inner, 0), ("link", ptr, 8)]);

    let out = extract(&pipeline, &mut f);
    let outer = out.snapshot.get("Outer").unwrap();
    assert_eq!(outer.member("inner").unwrap().type_ref, TypeRef::Named { name: "Inner".to_string() });
    assert_eq!(
        outer.member("link").unwrap().type_ref,
        TypeRef::Pointer { pointee: "Inner".to_string() }
    );
}

#[test]
fn test_snapshot_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(AuditConfig::new());
    let sections = c_fixtures().build().unwrap();
    let identity = BinaryIdentity::from_bytes(b"fixture build", Some("0123abcd".to_string()));
    let out = pipeline.snapshot_from_sections(&sections, Some(identity.clone())).unwrap();

    let store = SnapshotStore::new(dir.path());
    let path = store.save(&out.snapshot).unwrap();
    assert_eq!(path, store.path_for(&identity));

    let loaded = store.load(&identity).unwrap().unwrap();
    assert_eq!(loaded, out.snapshot);
    assert_eq!(loaded.to_json().unwrap(), out.snapshot.to_json().unwrap());
}

#[test]
fn test_huge_type_reports_without_overflow() {
    let pipeline = pipeline(AuditConfig::new().with_hot_path_tags(["Huge"]));
    let mut f = DwarfFixture::new(4, 8);
    let int = f.base_type("int", 4);
    let long = f.base_type("long", 8);
    let huge = f.structure("Huge", u64::MAX);
    f.member(huge, "head", int, 0);
    f.member(huge, "last", long, u64::MAX - 8);
    f.structure("Empty", u64::MAX);

    let out = extract(&pipeline, &mut f);
    let reports = pipeline.analyze(&out.snapshot).unwrap();

    let huge = reports.iter().find(|r| r.name == "Huge").unwrap();
    assert_eq!(huge.size, u64::MAX);
    assert_eq!(huge.used_bytes, 12);
    assert_eq!(huge.padding_bytes, u64::MAX - 12);
    assert_eq!(huge.cache_lines_spanned, u64::MAX.div_ceil(64));
    assert!(huge.cache_unfriendly);

    let empty = reports.iter().find(|r| r.name == "Empty").unwrap();
    assert_eq!(empty.padding_bytes, u64::MAX);
    assert_eq!(empty.used_bytes, 0);
}

#[test]
fn test_oversized_bitfield_storage_is_diagnosed() {
    let pipeline = pipeline(AuditConfig::new());
    let mut f = DwarfFixture::new(3, 8);
    let uint = f.base_type("unsigned int", 4);
    let s = f.structure("Flags", 4);
    f.legacy_bitfield(s, "a", uint, 0, u64::MAX / 4, 1, 3);
    f.legacy_bitfield(s, "b", uint, 0, 4, 28, 4);

    let out = extract(&pipeline, &mut f);
    let flags = out.snapshot.get("Flags").unwrap();
    assert!(flags.member("a").is_none());
    assert_eq!(flags.member("b").unwrap().bit_offset, Some(0));
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].member.as_deref(), Some("a"));

    let reports = pipeline.analyze(&out.snapshot).unwrap();
    assert_eq!(reports[0].used_bytes, 1);
}

#[test]
fn test_budget_check() {
    let pipeline = pipeline(
        AuditConfig::new()
            .with_budget("InternalPadding", TypeBudget::new().with_max_padding(4))
            .with_budget("Hot*", TypeBudget::new().with_max_size(64))
            .with_budget("*Header", TypeBudget::new().with_max_padding_percent(25.0))
            .with_budget("Missing", TypeBudget::new().with_max_size(8))
            .with_budget("net::*", TypeBudget::new().with_max_size(8)),
    );
    let out = extract(&pipeline, &mut c_fixtures());
    let outcome = pipeline.check(&out.snapshot).unwrap();

    assert!(!outcome.passed());
    assert_eq!(outcome.checked, 4);
    let found: Vec<(&str, ViolationKind)> = outcome
        .violations
        .iter()
        .map(|v| (v.type_name.as_str(), v.kind))
        .collect();
    assert_eq!(
        found,
        vec![
            ("InternalPadding", ViolationKind::MaxPadding),
            ("UnpackedHeader", ViolationKind::MaxPaddingPercent),
        ]
    );
    assert_eq!(outcome.unmatched_names, vec!["Missing".to_string()]);
    assert_eq!(outcome.unmatched_patterns, vec!["net::*".to_string()]);
}

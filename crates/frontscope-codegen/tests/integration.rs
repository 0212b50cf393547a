//! Integration tests for frontscope-codegen: parse the shared control header
//! fixture and regenerate the lookup table from it.

use frontscope_codegen::{
    CodegenError, EnumTable, UNUSED_ENUM, headers_equivalent, parse_enum, parse_enum_file,
    render_header, write_header,
};
use proptest::prelude::*;
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/device_control_shared.h")
}

#[test]
fn control_ret_codes_parse_from_fixture() {
    let def = parse_enum_file(fixture(), "control_ret_t").unwrap();
    assert_eq!(def.entries.len(), 19);
    assert_eq!(def.value_of("CONTROL_ERROR"), Some(8));
    assert_eq!(def.value_of("SERVICER_COMMAND_RETRY"), Some(64));
    assert_eq!(def.value_of("SERVICER_SPECIAL_COMMAND_BUF_SIZE_ERROR"), Some(73));
    assert_eq!(def.max_value(), Some(73));
}

#[test]
fn second_enum_in_fixture_is_reachable() {
    let def = parse_enum_file(fixture(), "control_direction_t").unwrap();
    assert_eq!(def.value_of("CONTROL_READ"), Some(0x80));
    assert_eq!(def.value_of("CONTROL_WRITE"), Some(0));
}

#[test]
fn generated_header_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("src.autogen/control_ret_str_map.h");

    let def = parse_enum_file(fixture(), "control_ret_t").unwrap();
    let table = EnumTable::from_definition(&def);
    write_header(&out, &table, "control_ret_t").unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(headers_equivalent(&written, &render_header(&table, "control_ret_t")));
    assert!(written.contains("const char *control_ret_str_map[] ="));

    let names: Vec<&str> = written
        .lines()
        .filter_map(|l| l.trim().strip_prefix('"'))
        .filter_map(|l| l.strip_suffix("\","))
        .collect();
    assert_eq!(names.len(), 256);
    assert_eq!(names[8], "CONTROL_ERROR");
    assert_eq!(names[9], UNUSED_ENUM);
    assert_eq!(names[69], "SERVICER_SPECIAL_COMMAND_ALREADY_ONGOING");
}

#[test]
fn missing_header_is_a_read_error() {
    let err = parse_enum_file("/no/such/header.h", "control_ret_t").unwrap_err();
    assert!(matches!(err, CodegenError::ReadFile { .. }));
}

#[test]
fn truncated_fixture_is_unterminated() {
    let text = std::fs::read_to_string(fixture()).unwrap();
    let cut = &text[..text.find("} control_ret_t;").unwrap()];
    assert!(matches!(
        parse_enum(cut, "control_ret_t"),
        Err(CodegenError::Unterminated { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For any set of distinct values, every symbol lands in its own slot and
    /// everything else stays unused.
    #[test]
    fn table_maps_each_value_to_its_symbol(values in prop::collection::btree_set(0u8..=255, 1..40)) {
        let body: String = values
            .iter()
            .map(|v| format!("    SYM_{v} = {v},\n"))
            .collect();
        let src = format!("typedef enum {{\n{body}}} gen_t;\n");

        let def = parse_enum(&src, "gen_t").unwrap();
        let table = EnumTable::from_definition(&def);
        for slot in 0..=255u8 {
            if values.contains(&slot) {
                prop_assert_eq!(table.get(slot), format!("SYM_{slot}"));
            } else {
                prop_assert_eq!(table.get(slot), UNUSED_ENUM);
            }
        }
    }

    /// Implicit values continue from the previous enumerator.
    #[test]
    fn implicit_values_follow_previous(start in 0u8..200, count in 1usize..50) {
        let mut body = format!("    FIRST = {start},\n");
        for i in 1..count {
            body.push_str(&format!("    NEXT_{i},\n"));
        }
        let src = format!("typedef enum {{\n{body}}} gen_t;\n");

        let def = parse_enum(&src, "gen_t").unwrap();
        for (i, entry) in def.entries.iter().enumerate() {
            prop_assert_eq!(entry.value as usize, start as usize + i);
        }
    }
}

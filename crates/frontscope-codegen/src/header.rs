//! C header rendering for lookup tables.

use crate::table::EnumTable;
use crate::{CodegenError, Result};
use std::fmt;
use std::path::Path;

/// C array identifier for an enum: `control_ret_t` becomes `control_ret_str_map`.
pub fn array_name(enum_name: &str) -> String {
    let stem = enum_name.strip_suffix("_t").unwrap_or(enum_name);
    format!("{stem}_str_map")
}

/// Borrowed view that formats a table as a C header.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    table: &'a EnumTable,
    enum_name: &'a str,
}

impl<'a> Header<'a> {
    /// Create a header view.
    pub fn new(table: &'a EnumTable, enum_name: &'a str) -> Self {
        Self { table, enum_name }
    }
}

impl fmt::Display for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/*********************************/")?;
        writeln!(f, "/* AUTOGENERATED. DO NOT MODIFY! */")?;
        writeln!(f, "/*********************************/")?;
        writeln!(f)?;
        writeln!(f, "// {} enum value to enum string mapping", self.enum_name)?;
        writeln!(f, "const char *{}[] =", array_name(self.enum_name))?;
        writeln!(f, "{{")?;
        for name in self.table.slots() {
            writeln!(f, "    \"{name}\",")?;
        }
        writeln!(f, "}};")
    }
}

/// Render the table as a C header declaring `const char *<array>[]`.
pub fn render_header(table: &EnumTable, enum_name: &str) -> String {
    Header::new(table, enum_name).to_string()
}

/// Render and write the header, creating parent directories.
pub fn write_header(path: impl AsRef<Path>, table: &EnumTable, enum_name: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CodegenError::write_file(parent, e))?;
    }
    std::fs::write(path, render_header(table, enum_name))
        .map_err(|e| CodegenError::write_file(path, e))?;
    tracing::info!(file = %path.display(), enum_name, "wrote lookup header");
    Ok(())
}

/// Compare two headers ignoring whitespace within lines, as `diff -w` does.
pub fn headers_equivalent(a: &str, b: &str) -> bool {
    let squash = |s: &str| -> Vec<String> {
        s.lines()
            .map(|l| l.chars().filter(|c| !c.is_whitespace()).collect())
            .collect()
    };
    squash(a) == squash(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_enum;

    fn table() -> EnumTable {
        let src = "typedef enum {\n OK,\n FAIL = 3\n} status_t;\n";
        EnumTable::from_definition(&parse_enum(src, "status_t").unwrap())
    }

    #[test]
    fn array_name_drops_type_suffix() {
        assert_eq!(array_name("control_ret_t"), "control_ret_str_map");
        assert_eq!(array_name("status"), "status_str_map");
    }

    #[test]
    fn header_lists_all_slots_in_order() {
        let text = render_header(&table(), "status_t");
        assert!(text.contains("const char *status_str_map[] ="));
        let entries: Vec<&str> = text.lines().filter(|l| l.starts_with("    \"")).collect();
        assert_eq!(entries.len(), 256);
        assert_eq!(entries[0], "    \"OK\",");
        assert_eq!(entries[3], "    \"FAIL\",");
        assert_eq!(entries[1], "    \"UNUSED_ENUM\",");
        assert!(text.trim_end().ends_with("};"));
    }

    #[test]
    fn equivalence_ignores_indentation_only() {
        let a = render_header(&table(), "status_t");
        let b = a.replace("    \"", "\t\"").replace(" =", "=  ");
        assert!(headers_equivalent(&a, &b));
        let c = a.replacen("FAIL", "FAIL2", 1);
        assert!(!headers_equivalent(&a, &c));
    }
}

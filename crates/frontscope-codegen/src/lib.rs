//! Enum-to-string lookup table generation.
//!
//! Parses a `typedef enum { … } <name>;` block out of a C header and renders a
//! header with a 256-entry `const char *` array indexed by enum value, so
//! firmware-side status codes can be printed by name.
//!
//! ```rust
//! use frontscope_codegen::{EnumTable, parse_enum, render_header};
//!
//! let src = "typedef enum {\n OK,\n BUSY = 4\n} status_t;\n";
//! let def = parse_enum(src, "status_t")?;
//! let table = EnumTable::from_definition(&def);
//! assert_eq!(table.get(4), "BUSY");
//! assert!(render_header(&table, "status_t").contains("status_str_map"));
//! # Ok::<(), frontscope_codegen::CodegenError>(())
//! ```

mod header;
mod parser;
mod table;

pub use header::{Header, array_name, headers_equivalent, render_header, write_header};
pub use parser::{EnumDefinition, EnumEntry, MAX_ENUM_VALUE, parse_enum, parse_enum_file};
pub use table::{EnumTable, TABLE_SIZE, UNUSED_ENUM};

use std::path::{Path, PathBuf};

/// Errors from enum parsing and header generation.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// No block for the requested enum was found.
    #[error("enum {enum_name} not found or not formatted as 'typedef enum {{ ... }} {enum_name};'")]
    NotFound {
        /// Requested typedef name.
        enum_name: String,
    },

    /// The block was opened but never closed.
    #[error("enum {enum_name} starting at line {start_line} is not terminated")]
    Unterminated {
        /// Requested typedef name.
        enum_name: String,
        /// Line of the `typedef enum {`.
        start_line: usize,
    },

    /// The block declares no enumerators.
    #[error("enum {enum_name} has no enumerators")]
    EmptyEnum {
        /// Requested typedef name.
        enum_name: String,
    },

    /// An enumerator line could not be understood.
    #[error("line {line}: malformed enumerator '{text}'")]
    MalformedEntry {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },

    /// An enumerator resolved to a negative value.
    #[error("line {line}: {name} has negative value {value}")]
    NegativeValue {
        /// Enumerator name.
        name: String,
        /// Resolved value.
        value: i64,
        /// 1-based line number.
        line: usize,
    },

    /// An enumerator does not fit the 256-entry table.
    #[error("line {line}: {name} = {value} exceeds the maximum table value of 255")]
    ValueOutOfRange {
        /// Enumerator name.
        name: String,
        /// Resolved value.
        value: i64,
        /// 1-based line number.
        line: usize,
    },

    /// Reading the input header failed.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// Header path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the generated header failed.
    #[error("failed to write {path}: {source}")]
    WriteFile {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    /// Create a read error for `path`.
    pub fn read_file(path: &Path, source: std::io::Error) -> Self {
        CodegenError::ReadFile {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a write error for `path`.
    pub fn write_file(path: &Path, source: std::io::Error) -> Self {
        CodegenError::WriteFile {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Convenience result type for code generation.
pub type Result<T> = std::result::Result<T, CodegenError>;

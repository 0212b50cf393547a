//! Non-linear model (NLModel) coefficient matrices.

use crate::dump::{read_f32_dump, write_f32_dump};
use crate::{Error, Result};
use std::fmt;
use std::path::Path;

/// How the matrix dimensions are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NlModelLayout {
    /// The first two values of the dump are the row and column counts.
    Header,
    /// The dump is payload only; dimensions come from elsewhere.
    Explicit {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },
}

/// A row-major NLModel matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct NlModel {
    rows: usize,
    cols: usize,
    coefficients: Vec<f32>,
}

impl NlModel {
    /// Build a matrix from row-major coefficients.
    pub fn new(rows: usize, cols: usize, coefficients: Vec<f32>) -> Option<Self> {
        (rows.checked_mul(cols) == Some(coefficients.len())).then_some(Self {
            rows,
            cols,
            coefficients,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Coefficient at (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.coefficients[row * self.cols + col])
        } else {
            None
        }
    }

    /// One row of the matrix.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        (row < self.rows).then(|| &self.coefficients[row * self.cols..(row + 1) * self.cols])
    }

    /// Row-major payload without any header.
    pub fn payload(&self) -> &[f32] {
        &self.coefficients
    }

    /// Write the payload as a headerless dump, the input format of the set command.
    pub fn write_payload<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_f32_dump(path, &self.coefficients)
    }
}

impl fmt::Display for NlModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row = &self.coefficients[r * self.cols..(r + 1) * self.cols];
            let open = if r == 0 { "[[" } else { " [" };
            let close = if r + 1 == self.rows { "]]" } else { "]" };
            write!(f, "{open}")?;
            for (i, v) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{v:.6e}")?;
            }
            writeln!(f, "{close}")?;
        }
        Ok(())
    }
}

/// Read an NLModel dump.
pub fn read_nlmodel<P: AsRef<Path>>(path: P, layout: NlModelLayout) -> Result<NlModel> {
    let path = path.as_ref();
    let values = read_f32_dump(path)?;

    let (rows, cols, payload) = match layout {
        NlModelLayout::Header => {
            if values.len() < 2 {
                return Err(Error::invalid(path, "missing row/column header"));
            }
            let rows = header_count(path, "row", values[0])?;
            let cols = header_count(path, "column", values[1])?;
            (rows, cols, values[2..].to_vec())
        }
        NlModelLayout::Explicit { rows, cols } => (rows, cols, values),
    };

    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| Error::invalid(path, format!("{rows} x {cols} matrix is too large")))?;
    if payload.len() != expected {
        return Err(Error::LengthMismatch {
            path: path.to_path_buf(),
            expected,
            actual: payload.len(),
        });
    }

    tracing::debug!(file = %path.display(), rows, cols, "read NLModel");
    Ok(NlModel {
        rows,
        cols,
        coefficients: payload,
    })
}

fn header_count(path: &Path, what: &str, value: f32) -> Result<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(Error::invalid(
            path,
            format!("{what} count {value} is not a non-negative integer"),
        ))
    }
}

/// Dimensions encoded in an explicit-layout file name, `<base>.r<rows>.c<cols>`.
pub fn dims_from_name<P: AsRef<Path>>(path: P) -> Option<(usize, usize)> {
    let name = path.as_ref().file_name()?.to_str()?;
    let (rest, cols) = name.rsplit_once(".c")?;
    let (_, rows) = rest.rsplit_once(".r")?;
    Some((rows.parse().ok()?, cols.parse().ok()?))
}

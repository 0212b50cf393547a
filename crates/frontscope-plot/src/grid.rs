//! Uniform subplot grid.
//!
//! Every figure, whether it holds one panel or twelve, is addressed the same
//! way: by `(row, col)` or by row-major index.

/// Grid of `rows × cols` equally sized cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotGrid {
    rows: usize,
    cols: usize,
}

impl PlotGrid {
    /// Create a grid. Returns `None` if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Option<Self> {
        (rows > 0 && cols > 0).then_some(Self { rows, cols })
    }

    /// Smallest grid holding `count` panels with at most `max_cols` columns.
    ///
    /// One panel gets a single cell; more fill `min(count, max_cols)` columns
    /// and `ceil(count / cols)` rows. A zero `count` still yields one cell.
    pub fn for_count(count: usize, max_cols: usize) -> Self {
        let cols = count.clamp(1, max_cols.max(1));
        let rows = count.div_ceil(cols).max(1);
        Self { rows, cols }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Always false; a grid has at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Row-major index of `(row, col)`, if inside the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    /// `(row, col)` of the row-major `index`, if inside the grid.
    pub fn cell_for(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.len()).then_some((index / self.cols, index % self.cols))
    }
}

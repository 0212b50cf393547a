//! Plot output for the frontscope tools.
//!
//! A [`Figure`] is a [`PlotGrid`] of [`Panel`]s. The grid is the same
//! abstraction for one panel and for many, so callers never special-case the
//! single-plot layout.
//!
//! ```rust,no_run
//! use frontscope_plot::{Figure, Panel, PlotGrid, Series};
//!
//! let grid = PlotGrid::for_count(3, 2);
//! let mut figure = Figure::new(grid);
//! for i in 0..3 {
//!     let y: Vec<f32> = (0..100).map(|n| (n as f32 * 0.1 * (i + 1) as f32).sin()).collect();
//!     figure.set_index(i, Panel::new(format!("panel {i}")).series(Series::from_samples(&y)))?;
//! }
//! figure.render("grid.png", 1400, 1000)?;
//! # Ok::<(), frontscope_plot::PlotError>(())
//! ```
//!
//! Titles, axis labels and tick labels are drawn only when the `ttf` feature
//! is enabled. Without it each panel renders as a frame, a zero line and its
//! series, and no text is ever handed to plotters.

mod figure;
mod grid;
mod viewer;

pub use figure::{Figure, Panel, Series};
pub use grid::PlotGrid;
pub use viewer::open_in_viewer;

/// Errors raised while building or rendering figures.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// A panel was placed outside the grid.
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} grid")]
    CellOutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
    },

    /// The requested image has no pixels.
    #[error("invalid figure size {width}x{height}")]
    InvalidSize {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// The drawing backend failed.
    #[error("rendering failed: {0}")]
    Render(String),

    /// The image viewer could not be started.
    #[error("failed to open viewer: {0}")]
    Viewer(#[from] std::io::Error),
}

/// Convenience result type for plotting.
pub type Result<T> = std::result::Result<T, PlotError>;

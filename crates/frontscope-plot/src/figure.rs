//! Figures of line-plot panels rendered to PNG.

use crate::grid::PlotGrid;
use crate::{PlotError, Result};
use plotters::prelude::*;
use std::path::Path;

/// Line colours, cycled per series within a panel.
const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// One line in a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label.
    pub label: Option<String>,
    /// `(x, y)` points in drawing order.
    pub points: Vec<(f32, f32)>,
}

impl Series {
    /// Build a series from parallel x and y slices; the longer one is cut.
    pub fn from_xy(x: &[f32], y: &[f32]) -> Self {
        Self {
            label: None,
            points: x.iter().copied().zip(y.iter().copied()).collect(),
        }
    }

    /// Build a series against the sample index.
    pub fn from_samples(y: &[f32]) -> Self {
        Self {
            label: None,
            points: y.iter().enumerate().map(|(i, &v)| (i as f32, v)).collect(),
        }
    }

    /// Attach a legend label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn bounds(&self) -> Option<((f32, f32), (f32, f32))> {
        let finite = self
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite());
        let mut bounds: Option<((f32, f32), (f32, f32))> = None;
        for &(x, y) in finite {
            bounds = Some(match bounds {
                None => ((x, x), (y, y)),
                Some(((x0, x1), (y0, y1))) => ((x0.min(x), x1.max(x)), (y0.min(y), y1.max(y))),
            });
        }
        bounds
    }
}

/// A single subplot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    /// Caption above the plot.
    pub title: String,
    /// X axis description.
    pub x_label: String,
    /// Y axis description.
    pub y_label: String,
    /// Lines to draw.
    pub series: Vec<Series>,
    /// Fixed x range; derived from data (and column sharing) when `None`.
    pub x_range: Option<(f32, f32)>,
    /// Fixed y range; derived from data when `None`.
    pub y_range: Option<(f32, f32)>,
}

impl Panel {
    /// Create an empty panel with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set both axis descriptions.
    pub fn labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    /// Add a line.
    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Fix the y range.
    pub fn y_range(mut self, low: f32, high: f32) -> Self {
        self.y_range = Some((low, high));
        self
    }

    /// Fix the x range.
    pub fn x_range(mut self, low: f32, high: f32) -> Self {
        self.x_range = Some((low, high));
        self
    }

    fn data_bounds(&self) -> Option<((f32, f32), (f32, f32))> {
        self.series
            .iter()
            .filter_map(Series::bounds)
            .reduce(|((ax0, ax1), (ay0, ay1)), ((bx0, bx1), (by0, by1))| {
                ((ax0.min(bx0), ax1.max(bx1)), (ay0.min(by0), ay1.max(by1)))
            })
    }
}

/// A grid of panels written to one image.
#[derive(Debug, Clone)]
pub struct Figure {
    grid: PlotGrid,
    panels: Vec<Option<Panel>>,
    share_x: bool,
}

impl Figure {
    /// Create a figure with every cell empty.
    pub fn new(grid: PlotGrid) -> Self {
        Self {
            grid,
            panels: vec![None; grid.len()],
            share_x: false,
        }
    }

    /// Share the x range among all panels of each column.
    pub fn share_x(mut self, share: bool) -> Self {
        self.share_x = share;
        self
    }

    /// The grid layout.
    pub fn grid(&self) -> PlotGrid {
        self.grid
    }

    /// Place a panel at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, panel: Panel) -> Result<()> {
        let index = self.grid.cell(row, col).ok_or(PlotError::CellOutOfRange {
            row,
            col,
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        })?;
        self.panels[index] = Some(panel);
        Ok(())
    }

    /// Place a panel at row-major `index`.
    pub fn set_index(&mut self, index: usize, panel: Panel) -> Result<()> {
        let (row, col) = self.grid.cell_for(index).ok_or(PlotError::CellOutOfRange {
            row: index / self.grid.cols(),
            col: index % self.grid.cols(),
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        })?;
        self.set(row, col, panel)
    }

    /// Panel at `(row, col)`, if one was placed.
    pub fn panel(&self, row: usize, col: usize) -> Option<&Panel> {
        self.grid
            .cell(row, col)
            .and_then(|i| self.panels[i].as_ref())
    }

    /// Number of cells holding a panel.
    pub fn panel_count(&self) -> usize {
        self.panels.iter().filter(|p| p.is_some()).count()
    }

    /// X range each cell is drawn with.
    ///
    /// Fixed panel ranges win, then the column-wide data range when sharing,
    /// then the panel's own data range.
    pub fn resolved_x_range(&self, row: usize, col: usize) -> Option<(f32, f32)> {
        let panel = self.panel(row, col)?;
        if let Some(range) = panel.x_range {
            return Some(range);
        }
        if self.share_x {
            return (0..self.grid.rows())
                .filter_map(|r| self.panel(r, col))
                .filter_map(|p| p.x_range.or_else(|| p.data_bounds().map(|(x, _)| x)))
                .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)));
        }
        panel.data_bounds().map(|(x, _)| x)
    }

    /// Render to a PNG of `width × height` pixels.
    pub fn render(&self, path: impl AsRef<Path>, width: u32, height: u32) -> Result<()> {
        let path = path.as_ref();
        if width == 0 || height == 0 {
            return Err(PlotError::InvalidSize { width, height });
        }

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let areas = root.split_evenly((self.grid.rows(), self.grid.cols()));

        for (index, area) in areas.iter().enumerate() {
            let Some((row, col)) = self.grid.cell_for(index) else {
                continue;
            };
            let Some(panel) = self.panel(row, col) else {
                continue;
            };
            let x_range = widen(self.resolved_x_range(row, col).unwrap_or((0.0, 1.0)));
            let y_range = widen(
                panel
                    .y_range
                    .or_else(|| panel.data_bounds().map(|(_, y)| pad(y)))
                    .unwrap_or((0.0, 1.0)),
            );
            draw_panel(area, panel, x_range, y_range)?;
        }

        root.present().map_err(render_err)?;
        tracing::info!(
            file = %path.display(),
            panels = self.panel_count(),
            rows = self.grid.rows(),
            cols = self.grid.cols(),
            "figure written"
        );
        Ok(())
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    panel: &Panel,
    (x0, x1): (f32, f32),
    (y0, y1): (f32, f32),
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(12);
    #[cfg(feature = "ttf")]
    builder
        .caption(&panel.title, ("sans-serif", 18))
        .x_label_area_size(36)
        .y_label_area_size(48);
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(render_err)?;

    #[cfg(feature = "ttf")]
    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .draw()
        .map_err(render_err)?;

    // Without a font backend any text panics inside plotters, so only the
    // plot frame is drawn.
    #[cfg(not(feature = "ttf"))]
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(x0, y0), (x1, y1)],
            BLACK.stroke_width(1),
        )))
        .map_err(render_err)?;

    if y0 < 0.0 && y1 > 0.0 {
        let zero = LineSeries::new([(x0, 0.0), (x1, 0.0)], RGBColor(200, 200, 200));
        chart.draw_series(zero).map_err(render_err)?;
    }

    for (i, series) in panel.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let points = series
            .points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| (x, y.clamp(y0, y1)));
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(1)))
            .map_err(render_err)?;
    }

    Ok(())
}

fn render_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Render(err.to_string())
}

/// Pad a data range by 5 % on each side.
fn pad((low, high): (f32, f32)) -> (f32, f32) {
    let margin = (high - low) * 0.05;
    (low - margin, high + margin)
}

/// Ensure a drawable, non-degenerate range.
fn widen((low, high): (f32, f32)) -> (f32, f32) {
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if high > low {
        (low, high)
    } else {
        let half = low.abs().max(1.0) * 0.5;
        (low - half, low + half)
    }
}

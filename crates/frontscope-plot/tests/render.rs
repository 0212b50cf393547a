//! Rendering tests: figures of every grid shape produce a PNG file.

use frontscope_plot::{Figure, Panel, PlotError, PlotGrid, Series};
use tempfile::TempDir;

fn sine_panel(i: usize) -> Panel {
    let x: Vec<f32> = (0..200).map(|n| n as f32 * 40.0).collect();
    let y: Vec<f32> = (0..200)
        .map(|n| (n as f32 * 0.05 * (i + 1) as f32).sin())
        .collect();
    Panel::new(format!("panel {i}"))
        .labels("Frequency (Hz)", "Coherence")
        .series(Series::from_xy(&x, &y).with_label("curve"))
        .y_range(-1.1, 1.1)
}

fn is_png(path: &std::path::Path) -> bool {
    let bytes = std::fs::read(path).unwrap();
    bytes.starts_with(&[0x89, b'P', b'N', b'G'])
}

#[test]
fn every_panel_count_renders() {
    let dir = TempDir::new().unwrap();
    for count in 1..=4 {
        let mut fig = Figure::new(PlotGrid::for_count(count, 2));
        for i in 0..count {
            fig.set_index(i, sine_panel(i)).unwrap();
        }
        let path = dir.path().join(format!("grid_{count}.png"));
        fig.render(&path, 800, 600).unwrap();
        assert!(is_png(&path), "{count} panels did not produce a PNG");
    }
}

#[test]
fn shared_columns_and_non_finite_points_render() {
    let dir = TempDir::new().unwrap();
    let mut fig = Figure::new(PlotGrid::new(2, 2).unwrap()).share_x(true);
    for row in 0..2 {
        let taps: Vec<f32> = (0..64).map(|n| if n == row { 1.0 } else { 0.0 }).collect();
        fig.set(row, 0, Panel::new("time").series(Series::from_samples(&taps)))
            .unwrap();
        let db = vec![f32::NEG_INFINITY, -20.0, -3.0, 0.0];
        fig.set(
            row,
            1,
            Panel::new("freq")
                .series(Series::from_xy(&[0.0, 1000.0, 4000.0, 8000.0], &db))
                .y_range(-75.0, 5.0),
        )
        .unwrap();
    }

    let path = dir.path().join("aec.png");
    fig.render(&path, 900, 600).unwrap();
    assert!(is_png(&path));
}

#[test]
fn zero_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let fig = Figure::new(PlotGrid::for_count(1, 1));
    let err = fig.render(dir.path().join("x.png"), 0, 100).unwrap_err();
    assert!(matches!(err, PlotError::InvalidSize { .. }));
}

#[test]
fn empty_cells_are_left_blank() {
    let dir = TempDir::new().unwrap();
    let mut fig = Figure::new(PlotGrid::for_count(3, 2));
    fig.set_index(0, sine_panel(0)).unwrap();
    assert_eq!(fig.panel_count(), 1);

    let path = dir.path().join("sparse.png");
    fig.render(&path, 600, 600).unwrap();
    assert!(is_png(&path));
}

#[test]
fn titled_and_labelled_panels_render_with_default_features() {
    let dir = TempDir::new().unwrap();
    let mut fig = Figure::new(PlotGrid::for_count(2, 2));
    fig.set_index(0, sine_panel(0)).unwrap();
    fig.set_index(
        1,
        Panel::new("Response of filter 0 to mic 1")
            .labels("Time (samples)", "Amplitude")
            .series(Series::from_samples(&[0.0, 0.5, -0.25, 0.0]).with_label("taps")),
    )
    .unwrap();

    let path = dir.path().join("labelled.png");
    fig.render(&path, 640, 480).unwrap();
    assert!(is_png(&path));
}

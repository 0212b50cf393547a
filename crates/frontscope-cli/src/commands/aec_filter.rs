//! AEC filter coefficient plots.

use super::common::{base_name, save_figure};
use clap::Args;
use frontscope_analysis::FilterResponse;
use frontscope_config::FrontscopeConfig;
use frontscope_io::read_aec_filters;
use frontscope_plot::{Figure, Panel, PlotGrid, Series};
use std::path::PathBuf;

#[derive(Args)]
pub struct AecFilterArgs {
    /// Filter dump name without the reference/microphone suffix
    #[arg(value_name = "BASE")]
    base: String,

    /// Number of microphone inputs
    #[arg(short = 'm', long, default_value = "4")]
    num_mics: usize,

    /// Number of far-end reference inputs
    #[arg(short = 'r', long, default_value = "1")]
    num_ref: usize,

    /// Sample rate of the filters (defaults to the canonical rate)
    #[arg(long)]
    rate: Option<u32>,

    /// Open the figure after saving it
    #[arg(long)]
    show: bool,
}

pub fn run(args: AecFilterArgs, config: &FrontscopeConfig) -> anyhow::Result<()> {
    if args.num_mics == 0 || args.num_ref == 0 {
        anyhow::bail!("at least one reference and one microphone are required");
    }
    let rate = args.rate.unwrap_or(config.analysis.canonical_rate);
    let filters = read_aec_filters(&args.base, args.num_ref, args.num_mics, &config.files)?;

    let grid = PlotGrid::new(filters.len(), 2)
        .ok_or_else(|| anyhow::anyhow!("no filter files to plot"))?;
    let mut figure = Figure::new(grid).share_x(true);

    for (row, filter) in filters.iter().enumerate() {
        let name = filter.name();
        let response = FilterResponse::from_impulse(&filter.coefficients, rate as f32)?;
        println!("{name}: Magnitude response peak = {} dB", response.peak_db());

        figure.set(
            row,
            0,
            Panel::new(format!("{name}, time"))
                .labels("samples", "Amplitude")
                .series(Series::from_samples(&filter.coefficients)),
        )?;

        let (low, high) = response.display_range();
        figure.set(
            row,
            1,
            Panel::new(format!("{name}, freq"))
                .labels("frequency(Hz)", "Magnitude(dB)")
                .y_range(low, high)
                .series(Series::from_xy(&response.frequencies, &response.magnitude_db)),
        )?;
    }

    let output = filters
        .first()
        .map(|f| PathBuf::from(format!("{}.png", base_name(&f.path))))
        .unwrap_or_else(|| PathBuf::from("aec_filter.png"));
    save_figure(&figure, &output, &config.plot, args.show)
}

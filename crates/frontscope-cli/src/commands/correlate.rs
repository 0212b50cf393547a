//! Reference-to-microphone delay tracking.

use super::common::{load_canonical, save_figure};
use clap::Args;
use frontscope_analysis::DelayEstimator;
use frontscope_analysis::export::export_delay_csv;
use frontscope_config::FrontscopeConfig;
use frontscope_plot::{Figure, Panel, PlotGrid, Series};
use std::path::PathBuf;

#[derive(Args)]
pub struct CorrelateArgs {
    /// Stereo WAV file (channel 0 microphone, channel 1 reference)
    #[arg(value_name = "WAV")]
    input: PathBuf,

    /// Output figure (defaults to the configured prefix plus the file stem)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the per-window results as CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Open the figure after saving it
    #[arg(long)]
    show: bool,
}

pub fn run(args: CorrelateArgs, config: &FrontscopeConfig) -> anyhow::Result<()> {
    let recording = load_canonical(&args.input, config)?;
    let (Some(mic), Some(reference), 2) = (
        recording.channel(0),
        recording.channel(1),
        recording.num_channels(),
    ) else {
        anyhow::bail!(
            "Error: Only stereo files supported. {} channels file given.",
            recording.num_channels()
        );
    };

    let window = config.analysis.correlation_window;
    let estimator = DelayEstimator::new(window, config.analysis.hop(window), recording.sample_rate)?;
    let analysis = estimator.analyze(mic, reference)?;

    println!(
        "{}: {} windows of {} samples",
        recording.name,
        analysis.windows.len(),
        analysis.window
    );
    if let (Some(overall), Some(dominant)) = (analysis.overall_lag(), analysis.dominant_lag()) {
        println!("Mean correlation peak at lag {overall} samples, most frequent window lag {dominant}");
    }

    let times = analysis.times();
    let lags: Vec<f32> = analysis.lag_series().iter().map(|&l| l as f32).collect();
    let lag_axis: Vec<f32> = analysis.lags.iter().map(|&l| l as f32).collect();

    let mut figure = Figure::new(PlotGrid::for_count(3, 1));
    figure.set_index(
        0,
        Panel::new("ref-mic delay")
            .labels("time", "corr delay (samples)")
            .series(Series::from_xy(&times, &lags)),
    )?;
    figure.set_index(
        1,
        Panel::new("Mean correlation")
            .labels("lag", "correlation")
            .series(Series::from_xy(&lag_axis, &analysis.mean_abs_correlation())),
    )?;
    figure.set_index(
        2,
        Panel::new("corr peak2ave ratio")
            .labels("time", "peak2ave ratio")
            .series(Series::from_xy(&times, &analysis.ratio_series())),
    )?;

    if let Some(csv) = &args.csv {
        export_delay_csv(&analysis, csv)?;
        println!("Delay data saved in {}", csv.display());
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(config.files.correlation_figure(&recording.name)));
    save_figure(&figure, &output, &config.plot, args.show)
}

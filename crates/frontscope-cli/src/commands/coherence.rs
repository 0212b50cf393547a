//! Microphone coherence plots.

use super::common::{load_canonical, save_figure};
use clap::Args;
use frontscope_analysis::export::export_coherence_csv;
use frontscope_analysis::{AnalysisError, CoherenceAnalyzer, pairs_for_sources};
use frontscope_config::FrontscopeConfig;
use frontscope_io::truncate_to_common;
use frontscope_plot::{Figure, Panel, PlotGrid, Series};
use std::path::PathBuf;

#[derive(Args)]
pub struct CoherenceArgs {
    /// Input WAV files
    #[arg(value_name = "WAV", required = true)]
    inputs: Vec<PathBuf>,

    /// Output figure (defaults to the configured coherence figure name)
    #[arg(long)]
    figname: Option<PathBuf>,

    /// Also write the curves as CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Open the figure after saving it
    #[arg(long)]
    show: bool,
}

pub fn run(args: CoherenceArgs, config: &FrontscopeConfig) -> anyhow::Result<()> {
    let mut recordings = args
        .inputs
        .iter()
        .map(|path| load_canonical(path, config))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let min_length = truncate_to_common(&mut recordings);
    println!("min_length = {min_length}");

    let counts: Vec<usize> = recordings.iter().map(|r| r.num_channels()).collect();
    let pairs = pairs_for_sources(&counts);
    if pairs.is_empty() {
        anyhow::bail!("no channel pairs to compare: every input has a single channel");
    }
    println!("total_num_subplots = {}", pairs.len());

    let mut figure = Figure::new(PlotGrid::for_count(pairs.len(), 2));
    let mut curves = Vec::with_capacity(pairs.len());

    for (index, pair) in pairs.iter().enumerate() {
        let recording = &recordings[pair.source];
        let channel = |i: usize| {
            recording.channel(i).ok_or(AnalysisError::ChannelOutOfRange {
                index: i,
                channels: recording.num_channels(),
            })
        };

        let window = config.analysis.coherence_window(recording.sample_rate);
        let analyzer = CoherenceAnalyzer::with_overlap(
            recording.sample_rate as f32,
            window,
            config.analysis.overlap,
        )?;
        let coherence = analyzer.analyze(channel(pair.a)?, channel(pair.b)?)?;

        let title = format!("{} {pair}", recording.name);
        println!("{title}: mean coherence {:.3}", coherence.mean());
        tracing::debug!(
            pair = %pair,
            window,
            segments = coherence.segments,
            "coherence computed"
        );

        figure.set_index(
            index,
            Panel::new(&title)
                .labels("frequency [Hz]", "Magnitude-Squared Coherence")
                .y_range(0.0, 1.0)
                .series(Series::from_xy(&coherence.frequencies, &coherence.values)),
        )?;
        curves.push((format!("{}:{pair}", recording.name), coherence));
    }

    if let Some(csv) = &args.csv {
        export_coherence_csv(&curves, csv)?;
        println!("Coherence data saved in {}", csv.display());
    }

    let figname = args
        .figname
        .unwrap_or_else(|| PathBuf::from(&config.files.coherence_figure));
    save_figure(&figure, &figname, &config.plot, args.show)
}
